mod common;

use std::time::Duration;

use questbot::game::loot::RemainderPolicy;
use questbot::game::{BattleResult, GameError, Item, ScriptedDice};

#[tokio::test]
async fn solo_goblin_victory_is_persisted() {
    let (_dir, service) = common::service();
    service.create("hero").await.expect("create");

    let mut dice = ScriptedDice::new([8, 10, 8, 10, 8, 10, 8, 10, 8, 10]).with_picks([0]);
    let mut narrated = Vec::new();
    let summary = service
        .battle_with("hero", &mut dice, |r| narrated.push(r.round))
        .await
        .expect("battle");

    assert_eq!(summary.outcome.result, BattleResult::Victory);
    assert_eq!(summary.outcome.monster.name, "Goblin");
    assert_eq!(summary.outcome.rounds, 5);
    assert_eq!(narrated, vec![1, 2, 3, 4, 5]);
    assert_eq!(summary.leader_health, 60);

    let rewards = summary.rewards.expect("rewards");
    assert_eq!(rewards.total, vec![Item::currency("Gold", 50)]);

    let hero = service.profile("hero").await.expect("profile");
    assert_eq!(hero.health, 60);
    assert_eq!(hero.currency, 50);
    assert!(hero.inventory.is_empty());
}

#[tokio::test]
async fn party_splits_loot_by_damage() {
    let (_dir, service) = common::service();
    service.create("hero").await.expect("create");
    service.create("ally").await.expect("create");
    service.party_add("hero", "ally").await.expect("party");

    // per round: monster, hero, ally
    let mut dice = ScriptedDice::new([5, 15, 10, 5, 15, 10]).with_picks([0]);
    let summary = service
        .battle_with("hero", &mut dice, |_| {})
        .await
        .expect("battle");

    assert_eq!(summary.outcome.result, BattleResult::Victory);
    assert_eq!(summary.outcome.rounds, 2);
    let rewards = summary.rewards.expect("rewards");
    let shares: Vec<u32> = rewards.awards.iter().map(|a| a.share).collect();
    assert_eq!(shares, vec![60, 40]);

    assert_eq!(service.currency("hero").await.expect("hero"), 30);
    assert_eq!(service.currency("ally").await.expect("ally"), 20);
    // only the leader takes monster damage
    assert_eq!(service.profile("hero").await.expect("hero").health, 90);
    assert_eq!(service.profile("ally").await.expect("ally").health, 100);
}

#[tokio::test]
async fn top_contributor_keeps_the_remainder() {
    let mut game = common::fast_game();
    game.loot_remainder = RemainderPolicy::TopContributor;
    let (_dir, service) = common::service_with(game);
    for id in ["a", "b", "c"] {
        service.create(id).await.expect("create");
    }
    service.party_add("a", "b").await.expect("party");
    service.party_add("a", "c").await.expect("party");

    // Orc, three equal hits per round: 33% each and 2 gold left over
    let rolls = std::iter::repeat([5, 10, 10, 10]).take(3).flatten();
    let mut dice = ScriptedDice::new(rolls).with_picks([1]);
    let summary = service
        .battle_with("a", &mut dice, |_| {})
        .await
        .expect("battle");

    assert_eq!(summary.outcome.monster.name, "Orc");
    assert_eq!(summary.outcome.result, BattleResult::Victory);
    assert_eq!(service.currency("a").await.expect("a"), 28);
    assert_eq!(service.currency("b").await.expect("b"), 26);
    assert_eq!(service.currency("c").await.expect("c"), 26);
}

#[tokio::test]
async fn defeat_awards_nothing_and_persists_zero_health() {
    let (_dir, service) = common::service();
    service.create("hero").await.expect("create");

    // goblin always hits 12, hero always 5: hero drops after 9 rounds
    let rolls = std::iter::repeat([12, 5]).take(9).flatten();
    let mut dice = ScriptedDice::new(rolls).with_picks([0]);
    let summary = service
        .battle_with("hero", &mut dice, |_| {})
        .await
        .expect("battle");

    assert_eq!(summary.outcome.result, BattleResult::Defeat);
    assert!(summary.rewards.is_none());
    assert_eq!(summary.outcome.player_health, -8);
    assert_eq!(summary.leader_health, 0);
    let hero = service.profile("hero").await.expect("hero");
    assert_eq!(hero.health, 0);
    assert_eq!(hero.currency, 0);
}

#[tokio::test]
async fn deleted_party_members_are_skipped() {
    let (_dir, service) = common::service();
    service.create("hero").await.expect("create");
    service.create("ally").await.expect("create");
    service.party_add("hero", "ally").await.expect("party");
    service.delete("ally").await.expect("delete");

    let mut dice = ScriptedDice::new([8, 10, 8, 10, 8, 10, 8, 10, 8, 10]).with_picks([0]);
    let summary = service
        .battle_with("hero", &mut dice, |_| {})
        .await
        .expect("battle");

    assert_eq!(summary.skipped, vec!["ally".to_string()]);
    assert_eq!(summary.outcome.per_member_damage.len(), 1);
    assert_eq!(service.currency("hero").await.expect("hero"), 50);
}

#[tokio::test]
async fn battle_requires_a_character() {
    let (_dir, service) = common::service();
    let err = service.battle("nobody", |_| {}).await.unwrap_err();
    assert!(matches!(err, GameError::NotFound(ref id) if id == "nobody"));
}

#[tokio::test]
async fn potion_used_mid_battle_is_kept() {
    let mut game = common::fast_game();
    game.round_delay_ms = 50;
    let (_dir, service) = common::service_with(game);
    service.create("hero").await.expect("create");
    service
        .store()
        .update(|db| {
            if let Some(p) = db.players.get_mut("hero") {
                p.health = 50;
                p.add_item(Item::healing("Mega Potion", 100));
            }
            Ok(())
        })
        .await
        .expect("setup");

    let mut dice = ScriptedDice::new([5, 10, 5, 10, 5, 10, 5, 10, 5, 10]).with_picks([0]);
    let fight = service.battle_with("hero", &mut dice, |_| {});
    let heal = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        service.use_item("hero", "Mega Potion").await
    };
    let (summary, used) = tokio::join!(fight, heal);
    let summary = summary.expect("battle");
    let used = used.expect("use");

    assert_eq!(used.restored, 50);
    assert_eq!(summary.outcome.rounds, 5);
    // 50 + 50 healed - 25 taken
    assert_eq!(summary.leader_health, 75);
    let hero = service.profile("hero").await.expect("hero");
    assert_eq!(hero.health, 75);
    assert!(hero.inventory.is_empty());
    assert_eq!(hero.currency, 50);
}

#[tokio::test]
async fn leader_deleted_mid_battle_is_not_found() {
    let mut game = common::fast_game();
    game.round_delay_ms = 50;
    let (_dir, service) = common::service_with(game);
    service.create("hero").await.expect("create");

    let mut dice = ScriptedDice::new([5, 10, 5, 10, 5, 10, 5, 10, 5, 10]).with_picks([0]);
    let fight = service.battle_with("hero", &mut dice, |_| {});
    let quit = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        service.delete("hero").await
    };
    let (summary, deleted) = tokio::join!(fight, quit);
    deleted.expect("delete");
    assert!(matches!(summary, Err(GameError::NotFound(ref id)) if id == "hero"));
    assert!(!service.store().exists("hero").await.expect("exists"));
}
