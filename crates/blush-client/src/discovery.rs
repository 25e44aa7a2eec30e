//! Discovery deck: a batch of candidate profiles shown one at a time.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use blush_api::ApiError;
use blush_types::api::UserProfile;

use crate::backend::ProfileApi;
use crate::context::Context;

pub const DISCOVERY_BATCH: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: Option<String>,
    pub first_name: String,
    pub age: Option<u32>,
    pub photo: Option<String>,
    pub bio: Option<String>,
}

impl Card {
    pub fn from_profile(profile: &UserProfile, today: NaiveDate) -> Self {
        Self {
            id: profile.id.clone(),
            first_name: profile.first_name.clone().unwrap_or_default(),
            age: profile.age_on(today),
            photo: profile
                .photos
                .as_ref()
                .and_then(|p| p.first())
                .cloned(),
            bio: profile.bio.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
    index: usize,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards, index: 0 }
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.cards.len()
    }

    pub fn pass(&mut self) -> Option<Card> {
        let card = self.advance()?;
        debug!("Passed on {}", card.first_name);
        Some(card)
    }

    pub fn like(&mut self) -> Option<Card> {
        let card = self.advance()?;
        debug!("Liked {}", card.first_name);
        Some(card)
    }

    fn advance(&mut self) -> Option<Card> {
        let card = self.cards.get(self.index).cloned()?;
        self.index += 1;
        Some(card)
    }
}

/// Fetch a fresh deck.
pub async fn load<P: ProfileApi>(api: &P, ctx: &Context, today: NaiveDate) -> Result<Deck, ApiError> {
    match api.discover(DISCOVERY_BATCH).await {
        Ok(profiles) => {
            info!("Loaded {} profiles", profiles.len());
            let cards = profiles
                .iter()
                .map(|p| Card::from_profile(p, today))
                .collect();
            Ok(Deck::new(cards))
        }
        Err(e) => {
            if !ctx.intercept(&e).await {
                warn!("Failed to load discovery: {}", e);
            }
            Err(e)
        }
    }
}
