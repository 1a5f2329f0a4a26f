//! Proxy rotator
//!
//! Owns the currently active proxy identity. Rotation draws a new identity
//! uniformly at random from a fresh candidate set and replaces the current
//! one whole.

use crate::proxy::{ProxyIdentity, ProxySource};
use crate::ScraperError;
use rand::seq::IteratorRandom;
use rand::Rng;

/// Single owner of the active proxy identity
///
/// The random source is injected so tests can seed it and assert exactly
/// which candidate a rotation picks.
pub struct ProxyRotator<S, R> {
    source: S,
    rng: R,
    current: ProxyIdentity,
    rotations: u64,
}

impl<S: ProxySource, R: Rng> ProxyRotator<S, R> {
    /// Creates a rotator
    ///
    /// With a starting identity the rotator uses it as-is; without one it
    /// rotates exactly once before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::ProxySourceUnavailable`] if the initial
    /// rotation cannot obtain a proxy.
    pub async fn initialize(
        source: S,
        rng: R,
        starting: Option<ProxyIdentity>,
    ) -> Result<Self, ScraperError> {
        match starting {
            Some(identity) => {
                tracing::info!("Using initial proxy {}", identity);
                Ok(Self {
                    source,
                    rng,
                    current: identity,
                    rotations: 0,
                })
            }
            None => {
                let mut rng = rng;
                let first = Self::draw(&source, &mut rng).await?;
                tracing::info!("New proxy is {}", first);
                Ok(Self {
                    source,
                    rng,
                    current: first,
                    rotations: 1,
                })
            }
        }
    }

    /// Replaces the current identity with a random fresh candidate
    pub async fn rotate(&mut self) -> Result<ProxyIdentity, ScraperError> {
        let next = Self::draw(&self.source, &mut self.rng).await?;
        tracing::info!("New proxy is {} (was {})", next, self.current);
        self.current = next.clone();
        self.rotations += 1;
        Ok(next)
    }

    /// The active identity
    pub fn current(&self) -> &ProxyIdentity {
        &self.current
    }

    /// Number of rotations performed, including one made by `initialize`
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    async fn draw(source: &S, rng: &mut R) -> Result<ProxyIdentity, ScraperError> {
        let candidates = source.fetch_candidates().await?;
        candidates
            .into_iter()
            .choose(rng)
            .ok_or_else(|| ScraperError::ProxySourceUnavailable {
                url: source.listing_url().to_string(),
                message: "listing contained no usable proxies".to_string(),
            })
    }
}
