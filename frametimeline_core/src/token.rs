// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Prediction tokens.
//!
//! The timing predictor hands its predictions for a future frame to a
//! [`TokenManager`] and receives a [`Token`]. The token travels with the frame
//! through the pipeline; when the compositor wakes for the cycle, or a layer
//! submits a buffer for it, the token is resolved back into predictions.
//!
//! [`TokenStore`] keeps predictions for 120 ms after they
//! were issued. Pruning is purely by age: a token can be resolved any number
//! of times while it is retained.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::clock::{Clock, MonotonicClock};
use crate::time::{Duration, HostTime};
use crate::timing::{PredictionState, TimelineItem};

/// Opaque handle correlating a stored prediction with its consumers.
///
/// Tokens issued by one manager are strictly increasing.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub i64);

impl Token {
    /// A value no manager ever issues.
    pub const INVALID: Self = Self(-1);
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues tokens for predictions and resolves them back.
pub trait TokenManager: Send + Sync {
    /// Stores `prediction` and returns a new token for it.
    fn generate_token(&self, prediction: TimelineItem) -> Token;

    /// Returns the prediction stored for `token`, if it is still retained.
    fn resolve(&self, token: Token) -> Option<TimelineItem>;

    /// Returns `true` if `token` was ever issued by this manager, whether or
    /// not it is still retained.
    fn was_issued(&self, token: Token) -> bool;

    /// Resolves an optional token into a prediction state and predictions.
    ///
    /// No token, or a token this manager never issued, is
    /// [`PredictionState::None`]. An issued token that no longer resolves is
    /// [`PredictionState::Expired`].
    fn resolve_state(&self, token: Option<Token>) -> (PredictionState, TimelineItem) {
        let Some(token) = token else {
            return (PredictionState::None, TimelineItem::default());
        };
        if let Some(predictions) = self.resolve(token) {
            return (PredictionState::Valid, predictions);
        }
        if self.was_issued(token) {
            tracing::debug!(%token, "prediction token expired");
            (PredictionState::Expired, TimelineItem::default())
        } else {
            tracing::debug!(%token, "prediction token was never issued");
            (PredictionState::None, TimelineItem::default())
        }
    }
}

/// How long a prediction stays resolvable after it was issued.
const RETENTION: Duration = Duration::from_millis(120);

#[derive(Clone, Copy, Debug)]
struct StoredPrediction {
    issued_at: HostTime,
    prediction: TimelineItem,
}

#[derive(Debug)]
struct TokenState {
    next_token: i64,
    predictions: BTreeMap<Token, StoredPrediction>,
}

impl TokenState {
    /// Drops every prediction issued at least [`RETENTION`] before `now`.
    fn prune(&mut self, now: HostTime) {
        // Issue times grow with token values, so the oldest entries are first.
        while let Some(entry) = self.predictions.first_entry() {
            if now.signed_duration_since(entry.get().issued_at) >= RETENTION {
                entry.remove();
            } else {
                break;
            }
        }
    }
}

/// The production [`TokenManager`]: a time-windowed prediction map.
pub struct TokenStore<C: Clock = MonotonicClock> {
    clock: C,
    state: Mutex<TokenState>,
}

impl<C: Clock> fmt::Debug for TokenStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TokenStore")
            .field("next_token", &state.next_token)
            .field("retained", &state.predictions.len())
            .finish_non_exhaustive()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore {
    /// How long a prediction stays resolvable after it was issued.
    pub const RETENTION: Duration = RETENTION;

    /// Creates a store backed by the process monotonic clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl<C: Clock> TokenStore<C> {
    /// Creates a store that reads time from `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(TokenState {
                next_token: Token::INVALID.0 + 1,
                predictions: BTreeMap::new(),
            }),
        }
    }

    /// Returns the clock this store stamps predictions with.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of predictions currently retained.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.lock().predictions.len()
    }

    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock> TokenManager for TokenStore<C> {
    fn generate_token(&self, prediction: TimelineItem) -> Token {
        let now = self.clock.now();
        let mut state = self.lock();
        state.prune(now);
        let token = Token(state.next_token);
        state.next_token += 1;
        state.predictions.insert(
            token,
            StoredPrediction {
                issued_at: now,
                prediction,
            },
        );
        tracing::trace!(%token, retained = state.predictions.len(), "issued prediction token");
        token
    }

    fn resolve(&self, token: Token) -> Option<TimelineItem> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.prune(now);
        state.predictions.get(&token).map(|p| p.prediction)
    }

    fn was_issued(&self, token: Token) -> bool {
        token.0 > Token::INVALID.0 && token.0 < self.lock().next_token
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;

    fn store() -> TokenStore<Arc<ManualClock>> {
        TokenStore::with_clock(Arc::new(ManualClock::new(HostTime::from_millis(1000))))
    }

    #[test]
    fn tokens_strictly_increase() {
        let store = store();
        let a = store.generate_token(TimelineItem::default());
        let b = store.generate_token(TimelineItem::default());
        let c = store.generate_token(TimelineItem::default());
        assert!(a < b && b < c, "{a:?} {b:?} {c:?}");
        assert_ne!(a, Token::INVALID);
    }

    #[test]
    fn resolve_returns_stored_prediction() {
        let store = store();
        let prediction = TimelineItem::from_millis(0, 10, 20);
        let token = store.generate_token(prediction);
        assert_eq!(store.resolve(token), Some(prediction));
        assert_eq!(store.resolve(token), Some(prediction), "resolve must not consume");
        assert_eq!(
            store.resolve_state(Some(token)),
            (PredictionState::Valid, prediction)
        );
    }

    #[test]
    fn predictions_expire_after_retention() {
        let store = store();
        let token = store.generate_token(TimelineItem::from_millis(0, 10, 20));

        store.clock().advance(Duration::from_millis(119));
        assert!(store.resolve(token).is_some(), "still inside the window");

        store.clock().advance(Duration::from_millis(1));
        assert_eq!(store.resolve(token), None);
        assert_eq!(store.retained(), 0);
        assert_eq!(
            store.resolve_state(Some(token)).0,
            PredictionState::Expired
        );
    }

    #[test]
    fn generation_prunes_old_entries_only() {
        let store = store();
        let old = store.generate_token(TimelineItem::default());
        store.clock().advance(Duration::from_millis(60));
        let middle = store.generate_token(TimelineItem::default());
        store.clock().advance(Duration::from_millis(60));
        let new = store.generate_token(TimelineItem::default());

        assert_eq!(store.retained(), 2);
        assert!(store.resolve(old).is_none());
        assert!(store.resolve(middle).is_some());
        assert!(store.resolve(new).is_some());
    }

    #[test]
    fn unknown_tokens_have_no_prediction_state() {
        let store = store();
        store.generate_token(TimelineItem::default());
        assert_eq!(store.resolve(Token(42)), None);
        assert!(!store.was_issued(Token(42)));
        assert!(!store.was_issued(Token::INVALID));
        assert_eq!(store.resolve_state(Some(Token(42))).0, PredictionState::None);
        assert_eq!(store.resolve_state(None).0, PredictionState::None);
    }

    #[test]
    fn concurrent_generation_yields_unique_tokens() {
        let store = Arc::new(TokenStore::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| store.generate_token(TimelineItem::default()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut all: Vec<Token> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 400);
    }
}
