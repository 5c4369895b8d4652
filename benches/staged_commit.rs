//! Cost of the clone-mutate-commit cycle on a live session.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sage_arena::board::SlotId;
use sage_arena::cards::Sage;
use sage_arena::core::{ConnectionId, GameRules, UserId};
use sage_arena::effects::{AbilityEffectInterpreter, Effect, EffectContext, SlotRef};
use sage_arena::game::{GameSession, SessionSettings, TeamNumber};

fn quad() -> GameSession {
    let mut game = GameSession::new(
        SessionSettings::new("bench", 4).with_seed(1),
        GameRules::default(),
    )
    .unwrap();
    for (name, sage, team) in [
        ("a", Sage::Pyra, TeamNumber::One),
        ("b", Sage::Maris, TeamNumber::One),
        ("c", Sage::Terran, TeamNumber::Two),
        ("d", Sage::Zephyr, TeamNumber::Two),
    ] {
        let user = UserId::from(name);
        game.add_player(user.clone(), ConnectionId::from(name)).unwrap();
        game.select_sage(&user, sage).unwrap();
        game.join_team(&user, team).unwrap();
        game.toggle_ready(&user).unwrap();
    }
    game.prepare_start(&UserId::from("a")).unwrap();
    game
}

fn bench_clone(c: &mut Criterion) {
    let game = quad();
    c.bench_function("session_clone", |b| b.iter(|| black_box(game.clone())));
}

fn bench_effects(c: &mut Criterion) {
    let game = quad();
    let effects = [
        Effect::CollectGold { amount: 1 },
        Effect::boost(SlotRef::Fixed(SlotId::new(8)), 1),
        Effect::shield(SlotRef::Fixed(SlotId::new(8)), 1),
    ];
    let context = EffectContext::new(UserId::from("a"));

    c.bench_function("effect_list_commit", |b| {
        b.iter(|| {
            let mut staged = game.clone();
            black_box(AbilityEffectInterpreter::process(&mut staged, &effects, &context).unwrap())
        })
    });
}

criterion_group!(benches, bench_clone, bench_effects);
criterion_main!(benches);
