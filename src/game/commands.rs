//! Text command front-end.
//!
//! Parses chat-style lines (`/battle`, `use Health Potion`, ...) and renders
//! replies into an outbox channel. The shop reads the player's next line from
//! the same input channel as its choice.

use log::debug;
use tokio::sync::mpsc;

use crate::game::battle::{BattleResult, RoundReport};
use crate::game::errors::GameError;
use crate::game::loot::Distribution;
use crate::game::service::{BattleSummary, GameService};
use crate::game::shop::ShopOutcome;
use crate::game::types::Item;
use crate::logutil::escape_log;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    Battle,
    Inventory,
    Currency,
    Use(String),
    Delete,
    Shop,
    Party,
    PartyAdd(String),
    PartyRemove(String),
    Profile,
    Name(String),
    Help,
    Unknown(String),
}

impl Command {
    /// Parse one input line. A leading `/` is optional and verbs are case-insensitive.
    pub fn parse(line: &str) -> Option<Command> {
        let trimmed = line.trim();
        let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed).trim_start();
        if trimmed.is_empty() {
            return None;
        }
        let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (trimmed, ""),
        };
        let cmd = match verb.to_ascii_lowercase().as_str() {
            "create" => Command::Create,
            "battle" | "fight" => Command::Battle,
            "inventory" | "inv" | "i" => Command::Inventory,
            "currency" | "balance" | "gold" => Command::Currency,
            "use" if !rest.is_empty() => Command::Use(rest.to_string()),
            "delete" => Command::Delete,
            "shop" => Command::Shop,
            "party" => {
                let (sub, arg) = match rest.split_once(char::is_whitespace) {
                    Some((sub, arg)) => (sub.to_ascii_lowercase(), arg.trim().to_string()),
                    None => (rest.to_ascii_lowercase(), String::new()),
                };
                match (sub.as_str(), arg.is_empty()) {
                    ("", _) => Command::Party,
                    ("add", false) => Command::PartyAdd(arg),
                    ("remove" | "rm", false) => Command::PartyRemove(arg),
                    _ => Command::Unknown(trimmed.to_string()),
                }
            }
            "profile" | "stats" => Command::Profile,
            "name" if !rest.is_empty() => Command::Name(rest.to_string()),
            "help" | "?" => Command::Help,
            _ => Command::Unknown(trimmed.to_string()),
        };
        Some(cmd)
    }
}

pub fn help_text() -> &'static str {
    "Commands: /create, /battle, /inventory, /currency, /use <item>, /shop, \
/party [add|remove <id>], /profile, /name <display name>, /delete, /help"
}

/// Format an item list as `Name (type, value)` entries.
pub fn format_items(items: &[Item]) -> String {
    items
        .iter()
        .map(|item| format!("{} ({}, {})", item.name, item.kind, item.value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn guidance(id: &str, err: &GameError) -> String {
    match err {
        GameError::NotFound(_) => format!(
            "{}, you need to create a character using the /create command first!",
            id
        ),
        GameError::AlreadyExists(_) => format!("{}, you already have a character!", id),
        GameError::EmptyInventory => format!("{}, your inventory is empty!", id),
        GameError::NotUsable(name) => format!(
            "{}, you do not have the {} in your inventory or it cannot be used for healing.",
            id, name
        ),
        GameError::InvalidParty(reason) | GameError::InvalidName(reason) => {
            format!("{}, {}.", id, reason)
        }
        other => format!("{}, something went wrong: {}", id, other),
    }
}

/// Executes parsed commands for one player against the game service.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    service: GameService,
    outbox: mpsc::UnboundedSender<String>,
}

impl CommandProcessor {
    pub fn new(service: GameService, outbox: mpsc::UnboundedSender<String>) -> Self {
        Self { service, outbox }
    }

    fn say(&self, line: impl Into<String>) {
        let _ = self.outbox.send(line.into());
    }

    /// Handle one line from `player`. `input` is the same stream the line came
    /// from; the shop consumes the next line from it.
    pub async fn handle(
        &self,
        player: &str,
        line: &str,
        input: &mut mpsc::UnboundedReceiver<String>,
    ) {
        let Some(cmd) = Command::parse(line) else {
            return;
        };
        debug!("{} -> {:?}", escape_log(player), cmd);
        if let Err(e) = self.execute(player, cmd, input).await {
            self.say(guidance(player, &e));
        }
    }

    async fn execute(
        &self,
        player: &str,
        cmd: Command,
        input: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<(), GameError> {
        match cmd {
            Command::Create => {
                self.service.create(player).await?;
                self.say(format!("{}, your character has been created!", player));
            }
            Command::Battle => {
                let summary = self.battle(player).await?;
                self.report_battle(player, &summary);
            }
            Command::Inventory => {
                let items = self.service.inventory(player).await?;
                if items.is_empty() {
                    return Err(GameError::EmptyInventory);
                }
                self.say(format!("Inventory: {}", format_items(&items)));
            }
            Command::Currency => {
                let balance = self.service.currency(player).await?;
                self.say(format!(
                    "{}, your current currency balance is {}.",
                    player, balance
                ));
            }
            Command::Use(name) => {
                let used = self.service.use_item(player, &name).await?;
                self.say(format!(
                    "{}, you used the {} and restored {} health! ({}/{})",
                    player, used.item.name, used.restored, used.health, used.max_health
                ));
            }
            Command::Delete => {
                self.service.delete(player).await?;
                self.say(format!("{}, your character has been deleted!", player));
            }
            Command::Shop => self.shop(player, input).await?,
            Command::Party => {
                let party = self.service.party(player).await?;
                if party.is_empty() {
                    self.say(format!("{}, you are adventuring alone.", player));
                } else {
                    self.say(format!("Party: {}", party.join(", ")));
                }
            }
            Command::PartyAdd(member) => {
                let party = self.service.party_add(player, &member).await?;
                self.say(format!("{} joined your party. Party: {}", member, party.join(", ")));
            }
            Command::PartyRemove(member) => {
                self.service.party_remove(player, &member).await?;
                self.say(format!("{} left your party.", member));
            }
            Command::Profile => {
                let p = self.service.profile(player).await?;
                self.say(format!(
                    "{} | level {} | xp {} | health {}/{} | currency {} | party {}",
                    p.display_name(),
                    p.level,
                    p.experience,
                    p.health,
                    p.max_health,
                    p.currency,
                    p.party.len()
                ));
            }
            Command::Name(name) => {
                let name = self.service.rename(player, &name).await?;
                self.say(format!("{}, you will now be known as {}.", player, name));
            }
            Command::Help => self.say(help_text()),
            Command::Unknown(raw) => {
                self.say(format!("Unknown command: {}. {}", raw, help_text()));
            }
        }
        Ok(())
    }

    async fn battle(&self, player: &str) -> Result<BattleSummary, GameError> {
        let profile = self.service.profile(player).await?;
        let name = profile.display_name().to_string();
        let outbox = self.outbox.clone();
        self.service
            .battle(player, move |report: &RoundReport| {
                let _ = outbox.send(format!("{}'s Health: {:.2}%", name, report.player_percent));
                let _ = outbox.send(format!(
                    "{}'s Health: {:.2}%",
                    report.monster_name, report.monster_percent
                ));
            })
            .await
    }

    fn report_battle(&self, player: &str, summary: &BattleSummary) {
        let monster = &summary.outcome.monster.name;
        match summary.outcome.result {
            BattleResult::Defeat => {
                self.say(format!("{}, you were defeated by the {}!", player, monster));
                for member in summary.outcome.per_member_damage.iter().skip(1) {
                    self.say(format!(
                        "{}, your party member {} was defeated in battle!",
                        member.id, player
                    ));
                }
            }
            BattleResult::Victory => {
                self.say(format!("{}, you defeated the {}!", player, monster));
                if let Some(ref dist) = summary.rewards {
                    self.report_rewards(dist);
                }
            }
        }
    }

    fn report_rewards(&self, dist: &Distribution) {
        self.say("Battle Results:");
        for award in dist.awards.iter().filter(|a| !a.items.is_empty()) {
            self.say(format!(
                "Rewards for {} ({}%): {}",
                award.id,
                award.share,
                format_items(&award.items)
            ));
        }
        if !dist.total.is_empty() {
            self.say(format!("Total Rewards: {}", format_items(&dist.total)));
        }
    }

    async fn shop(
        &self,
        player: &str,
        input: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<(), GameError> {
        self.service.profile(player).await?;
        self.say("Shop - available items for purchase:");
        for entry in self.service.catalog() {
            self.say(format!("  {} | Type: {} | Price: {}", entry.name, entry.kind, entry.price));
        }
        self.say(format!("{}, type the name of the item you want to buy.", player));
        match self.service.shop(player, input).await? {
            ShopOutcome::Purchased(receipt) => self.say(format!(
                "{}, you bought the {} for {} currency.",
                player, receipt.item.name, receipt.price
            )),
            ShopOutcome::InsufficientFunds { item, .. } => self.say(format!(
                "{}, you do not have enough currency to buy the {}.",
                player, item
            )),
            ShopOutcome::UnknownItem(item) => self.say(format!(
                "{}, the {} is not available in the shop.",
                player, item
            )),
            ShopOutcome::Cancelled => self.say(format!(
                "{}, you took too long to respond. The shop session has ended.",
                player
            )),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_prefix_and_aliases() {
        assert_eq!(Command::parse("/battle"), Some(Command::Battle));
        assert_eq!(Command::parse("FIGHT"), Some(Command::Battle));
        assert_eq!(Command::parse("  /inv "), Some(Command::Inventory));
        assert_eq!(
            Command::parse("/use  Health Potion"),
            Some(Command::Use("Health Potion".into()))
        );
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("/"), None);
    }

    #[test]
    fn parse_party_subcommands() {
        assert_eq!(Command::parse("/party"), Some(Command::Party));
        assert_eq!(Command::parse("/party add 42"), Some(Command::PartyAdd("42".into())));
        assert_eq!(Command::parse("/party RM 42"), Some(Command::PartyRemove("42".into())));
        assert!(matches!(Command::parse("/party add"), Some(Command::Unknown(_))));
    }

    #[test]
    fn use_without_item_is_unknown() {
        assert!(matches!(Command::parse("/use"), Some(Command::Unknown(_))));
    }

    #[test]
    fn guidance_points_to_create() {
        let msg = guidance("7", &GameError::NotFound("7".into()));
        assert!(msg.contains("/create"));
    }
}
