//! Game operations exposed to the command layer.
//!
//! Every operation resolves the player id, reads through the store actor and
//! commits its changes as one serialized snapshot mutation.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use crate::config::GameConfig;
use crate::game::actor::StoreHandle;
use crate::game::battle::{pick_monster, Battle, BattleOutcome, BattleResult, Dice, RoundReport};
use crate::game::errors::GameError;
use crate::game::loot::{distribute, Distribution};
use crate::game::monster::default_bestiary;
use crate::game::shop::{apply_purchase, CatalogItem, Receipt, ShopOutcome};
use crate::game::types::{Item, ItemKind, PlayerRecord};
use crate::logutil::escape_log;

/// Longest display name accepted by [`GameService::rename`].
pub const MAX_NAME_CHARS: usize = 32;

/// Result of consuming a healing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseOutcome {
    pub item: Item,
    /// Health actually gained after clamping.
    pub restored: i32,
    pub health: i32,
    pub max_health: i32,
}

/// Everything the command layer needs to narrate a finished battle.
#[derive(Debug, Clone)]
pub struct BattleSummary {
    pub outcome: BattleOutcome,
    /// Present only on victory.
    pub rewards: Option<Distribution>,
    /// Leader health as persisted: the damage taken in the fight applied to the
    /// record as it stood at commit time, clamped to `[0, max_health]`.
    pub leader_health: i32,
    /// Party ids that no longer had a character and were left out.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GameService {
    store: StoreHandle,
    game: GameConfig,
}

impl GameService {
    pub fn new(store: StoreHandle, mut game: GameConfig) -> Self {
        if game.monsters.is_empty() {
            warn!("monster table is empty; using the built-in bestiary");
            game.monsters = default_bestiary();
        }
        Self { store, game }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn config(&self) -> &GameConfig {
        &self.game
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.game.shop
    }

    pub async fn create(&self, id: &str) -> Result<PlayerRecord, GameError> {
        let player = self.store.create(id).await?;
        info!("character created for {}", escape_log(id));
        Ok(player)
    }

    pub async fn delete(&self, id: &str) -> Result<(), GameError> {
        self.store.delete(id).await?;
        info!("character deleted for {}", escape_log(id));
        Ok(())
    }

    pub async fn profile(&self, id: &str) -> Result<PlayerRecord, GameError> {
        self.store.require(id).await
    }

    pub async fn inventory(&self, id: &str) -> Result<Vec<Item>, GameError> {
        Ok(self.store.require(id).await?.inventory)
    }

    pub async fn currency(&self, id: &str) -> Result<u64, GameError> {
        Ok(self.store.require(id).await?.currency)
    }

    /// Set the display name (trimmed, 1..=32 characters, no control characters).
    pub async fn rename(&self, id: &str, name: &str) -> Result<String, GameError> {
        let name = name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(GameError::InvalidName(format!(
                "names must be 1-{} characters",
                MAX_NAME_CHARS
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(GameError::InvalidName("control characters are not allowed".into()));
        }
        let id = id.to_string();
        let stored = name.clone();
        self.store
            .update(move |db| {
                let player = db
                    .players
                    .get_mut(&id)
                    .ok_or_else(|| GameError::NotFound(id.clone()))?;
                player.name = Some(stored);
                Ok(())
            })
            .await?;
        Ok(name)
    }

    /// Consume the first healing item called `item_name` (case-insensitive).
    pub async fn use_item(&self, id: &str, item_name: &str) -> Result<UseOutcome, GameError> {
        let id = id.to_string();
        let wanted = item_name.trim().to_string();
        let outcome = self
            .store
            .update(move |db| {
                let player = db
                    .players
                    .get_mut(&id)
                    .ok_or_else(|| GameError::NotFound(id.clone()))?;
                if player.inventory.is_empty() {
                    return Err(GameError::EmptyInventory);
                }
                let pos = player
                    .inventory
                    .iter()
                    .position(|item| {
                        item.kind == ItemKind::Healing && item.name.eq_ignore_ascii_case(&wanted)
                    })
                    .ok_or_else(|| GameError::NotUsable(wanted.clone()))?;
                let item = player.inventory.remove(pos);
                let restored = player.heal(item.value);
                Ok(UseOutcome {
                    item,
                    restored,
                    health: player.health,
                    max_health: player.max_health,
                })
            })
            .await?;
        debug!(
            "{} used {} (+{} hp)",
            escape_log(item_name),
            outcome.item.name,
            outcome.restored
        );
        Ok(outcome)
    }

    /// Buy `item_name` from the catalog: debit and delivery commit together or not at all.
    pub async fn purchase(&self, id: &str, item_name: &str) -> Result<Receipt, GameError> {
        let catalog = self.game.shop.clone();
        let buyer = id.to_string();
        let name = item_name.to_string();
        let receipt = self
            .store
            .update(move |db| apply_purchase(db, &catalog, &buyer, &name))
            .await?;
        info!(
            "{} bought {} for {} (balance {})",
            escape_log(id),
            receipt.item.name,
            receipt.price,
            receipt.balance
        );
        Ok(receipt)
    }

    /// Wait (bounded by `shop_timeout_secs`) for the player's choice on `replies`
    /// and try to buy it. A timeout or a closed channel ends the visit as
    /// [`ShopOutcome::Cancelled`].
    pub async fn shop(
        &self,
        id: &str,
        replies: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<ShopOutcome, GameError> {
        self.store.require(id).await?;
        let choice = match tokio::time::timeout(self.game.shop_timeout(), replies.recv()).await {
            Ok(Some(choice)) => choice,
            Ok(None) => {
                debug!("shop: reply channel closed for {}", escape_log(id));
                return Ok(ShopOutcome::Cancelled);
            }
            Err(_) => {
                info!("shop: {} for {}", GameError::InteractionTimeout, escape_log(id));
                return Ok(ShopOutcome::Cancelled);
            }
        };
        match self.purchase(id, &choice).await {
            Ok(receipt) => Ok(ShopOutcome::Purchased(receipt)),
            Err(GameError::InsufficientFunds { price, balance }) => Ok(ShopOutcome::InsufficientFunds {
                item: choice.trim().to_string(),
                price,
                balance,
            }),
            Err(GameError::UnknownItem(name)) => Ok(ShopOutcome::UnknownItem(name)),
            Err(e) => Err(e),
        }
    }

    pub async fn party(&self, id: &str) -> Result<Vec<String>, GameError> {
        Ok(self.store.require(id).await?.party)
    }

    /// Add an existing character to `id`'s party.
    pub async fn party_add(&self, id: &str, member: &str) -> Result<Vec<String>, GameError> {
        let id = id.to_string();
        let member = member.trim().to_string();
        self.store
            .update(move |db| {
                if !db.players.contains_key(&id) {
                    return Err(GameError::NotFound(id.clone()));
                }
                if member == id {
                    return Err(GameError::InvalidParty("you are always in your own party".into()));
                }
                if !db.players.contains_key(&member) {
                    return Err(GameError::InvalidParty(format!("{} has no character", member)));
                }
                let player = db
                    .players
                    .get_mut(&id)
                    .ok_or_else(|| GameError::NotFound(id.clone()))?;
                if player.party.contains(&member) {
                    return Err(GameError::InvalidParty(format!("{} is already in your party", member)));
                }
                player.party.push(member);
                Ok(player.party.clone())
            })
            .await
    }

    pub async fn party_remove(&self, id: &str, member: &str) -> Result<Vec<String>, GameError> {
        let id = id.to_string();
        let member = member.trim().to_string();
        self.store
            .update(move |db| {
                let player = db
                    .players
                    .get_mut(&id)
                    .ok_or_else(|| GameError::NotFound(id.clone()))?;
                let before = player.party.len();
                player.party.retain(|m| m != &member);
                if player.party.len() == before {
                    return Err(GameError::InvalidParty(format!("{} is not in your party", member)));
                }
                Ok(player.party.clone())
            })
            .await
    }

    /// Fight a random monster with fresh entropy. See [`GameService::battle_with`].
    pub async fn battle(
        &self,
        id: &str,
        narrate: impl FnMut(&RoundReport) + Send,
    ) -> Result<BattleSummary, GameError> {
        let mut rng = StdRng::from_entropy();
        self.battle_with(id, &mut rng, narrate).await
    }

    /// Run a full battle for `id` and its party, pausing `round_delay_ms`
    /// between rounds, then persist the leader's damage and any loot in a
    /// single store mutation. `narrate` sees every round as it happens.
    /// Fails with `NotFound` if the leader was deleted during the fight.
    pub async fn battle_with<D: Dice + Send>(
        &self,
        id: &str,
        dice: &mut D,
        mut narrate: impl FnMut(&RoundReport) + Send,
    ) -> Result<BattleSummary, GameError> {
        let db = self.store.load().await?;
        let leader = db
            .players
            .get(id)
            .cloned()
            .ok_or_else(|| GameError::NotFound(id.to_string()))?;
        let mut party = Vec::with_capacity(leader.party.len());
        let mut skipped = Vec::new();
        for member_id in &leader.party {
            match db.players.get(member_id) {
                Some(member) => party.push(member.clone()),
                None => skipped.push(member_id.clone()),
            }
        }
        if !skipped.is_empty() {
            debug!("battle: skipping unresolved party members {:?}", skipped);
        }

        let monster = pick_monster(&self.game.monsters, dice).ok_or(GameError::NoMonsters)?;
        info!(
            "battle: {} (+{} allies) engages {}",
            escape_log(id),
            party.len(),
            monster.name
        );

        let delay = self.game.round_delay();
        let mut battle = Battle::new(&leader, &party, monster);
        while let Some(report) = battle.round(dice) {
            narrate(&report);
            if !battle.is_resolved() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        let outcome = battle.run_to_completion(dice);

        let rewards = match outcome.result {
            BattleResult::Victory => Some(distribute(
                &outcome.per_member_damage,
                &outcome.monster.loot,
                self.game.loot_remainder,
            )),
            BattleResult::Defeat => None,
        };

        // Only the damage taken is applied; health changes made between rounds survive.
        let leader_id = id.to_string();
        let taken = leader.health.saturating_sub(outcome.player_health).max(0);
        let awards = rewards.clone();
        let leader_health = self
            .store
            .update(move |db| {
                let player = db
                    .players
                    .get_mut(&leader_id)
                    .ok_or_else(|| GameError::NotFound(leader_id.clone()))?;
                player.health = player.health.saturating_sub(taken).clamp(0, player.max_health);
                let persisted = player.health;
                if let Some(dist) = awards {
                    for award in dist.awards {
                        match db.players.get_mut(&award.id) {
                            Some(member) => award.items.into_iter().for_each(|item| member.add_item(item)),
                            None => warn!("battle: {} vanished before loot was handed out", award.id),
                        }
                    }
                }
                Ok(persisted)
            })
            .await?;

        info!(
            "battle: {} {:?} vs {} after {} round(s)",
            escape_log(id),
            outcome.result,
            outcome.monster.name,
            outcome.rounds
        );
        Ok(BattleSummary {
            outcome,
            rewards,
            leader_health,
            skipped,
        })
    }
}
