//! Game sessions during setup.
//!
//! A [`GameSession`] owns the players, both teams, both shops, the rules
//! and the session RNG. It carries every operation from the first join up
//! to the end of warrior selection. [`Session`] wraps it together with the
//! promoted [`ActiveGameSession`] so the registry can store either.
//!
//! ## Host
//!
//! The first player to join is the host. When the host leaves, the next
//! player in join order takes over. Host-gated transitions fail with
//! `HostOnly` for everyone else.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::active::ActiveGameSession;
use super::player::Player;
use super::shop::{Shop, ShopKind};
use super::team::{Team, TeamNumber};
use crate::cards::{creature_shop_stock, item_shop_stock, Card, CardId, Decklist, Sage};
use crate::core::{
    ConnectionId, EngineError, EngineResult, GameRng, GameRules, SessionId, UserId,
};

/// Parameters a session is created with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub id: SessionId,
    pub name: String,
    pub is_private: bool,
    pub password: Option<String>,
    /// 2 or 4.
    pub num_players_total: usize,
    pub seed: u64,
}

impl SessionSettings {
    #[must_use]
    pub fn new(id: impl Into<SessionId>, num_players_total: usize) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            is_private: false,
            password: None,
            num_players_total,
            seed: 0,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.is_private = true;
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A session before promotion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub name: String,
    pub is_private: bool,
    pub password: Option<String>,
    pub num_players_total: usize,
    players: im::Vector<Player>,
    team1: Team,
    team2: Team,
    /// Team acting first, then second.
    team_order: [TeamNumber; 2],
    creature_shop: Shop,
    item_shop: Shop,
    pub is_started: bool,
    pub has_finished_setup: bool,
    rules: GameRules,
    rng: GameRng,
}

impl GameSession {
    /// Create an empty session. Team order is drawn from the session RNG.
    #[instrument(skip(rules), fields(session_id = %settings.id))]
    pub fn new(settings: SessionSettings, rules: GameRules) -> EngineResult<Self> {
        let total = settings.num_players_total;
        if total != 2 && total != 4 {
            return Err(EngineError::validation(format!(
                "a session needs 2 or 4 players, got {}",
                total
            )));
        }
        let team_size = total / 2;
        let mut rng = GameRng::new(settings.seed);
        let team_order = if rng.gen_bool(0.5) {
            [TeamNumber::One, TeamNumber::Two]
        } else {
            [TeamNumber::Two, TeamNumber::One]
        };
        let creature_shop = Shop::new(ShopKind::Creature, creature_shop_stock(), rules.shop_size, &mut rng);
        let item_shop = Shop::new(ShopKind::Item, item_shop_stock(), rules.shop_size, &mut rng);

        info!(players = total, first = %team_order[0], "session created");
        Ok(Self {
            id: settings.id,
            name: settings.name,
            is_private: settings.is_private,
            password: settings.password,
            num_players_total: total,
            players: im::Vector::new(),
            team1: Team::new(TeamNumber::One, team_size, &rules)?,
            team2: Team::new(TeamNumber::Two, team_size, &rules)?,
            team_order,
            creature_shop,
            item_shop,
            is_started: false,
            has_finished_setup: false,
            rules,
            rng,
        })
    }

    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    #[must_use]
    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    #[must_use]
    pub fn team_order(&self) -> [TeamNumber; 2] {
        self.team_order
    }

    #[must_use]
    pub fn team_size(&self) -> usize {
        self.num_players_total / 2
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.num_players_total
    }

    fn player_index(&self, user: &UserId) -> EngineResult<usize> {
        self.players
            .iter()
            .position(|p| &p.user_id == user)
            .ok_or_else(|| EngineError::not_found(format!("player {}", user)))
    }

    pub fn player(&self, user: &UserId) -> EngineResult<&Player> {
        let index = self.player_index(user)?;
        Ok(&self.players[index])
    }

    pub fn player_mut(&mut self, user: &UserId) -> EngineResult<&mut Player> {
        let index = self.player_index(user)?;
        Ok(&mut self.players[index])
    }

    #[must_use]
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_game_host)
    }

    #[must_use]
    pub fn team(&self, number: TeamNumber) -> &Team {
        match number {
            TeamNumber::One => &self.team1,
            TeamNumber::Two => &self.team2,
        }
    }

    pub fn team_mut(&mut self, number: TeamNumber) -> &mut Team {
        match number {
            TeamNumber::One => &mut self.team1,
            TeamNumber::Two => &mut self.team2,
        }
    }

    /// Clear the day-break marks on both fields and in every pile a card
    /// may have been moved to.
    pub fn reset_day_breaks(&mut self) {
        self.team1.battlefield.reset_day_breaks();
        self.team2.battlefield.reset_day_breaks();
        for player in self.players.iter_mut() {
            player.reset_day_breaks();
        }
    }

    /// Team the user is on, if any.
    #[must_use]
    pub fn team_of(&self, user: &UserId) -> Option<TeamNumber> {
        [TeamNumber::One, TeamNumber::Two]
            .into_iter()
            .find(|number| self.team(*number).contains(user))
    }

    pub fn require_team_of(&self, user: &UserId) -> EngineResult<TeamNumber> {
        self.team_of(user)
            .ok_or_else(|| EngineError::not_found(format!("team of {}", user)))
    }

    /// The player and one team, borrowed mutably together.
    pub fn player_and_team_mut(
        &mut self,
        user: &UserId,
        number: TeamNumber,
    ) -> EngineResult<(&mut Player, &mut Team)> {
        let index = self.player_index(user)?;
        let team = match number {
            TeamNumber::One => &mut self.team1,
            TeamNumber::Two => &mut self.team2,
        };
        Ok((&mut self.players[index], team))
    }

    /// Players of a team, in roster order.
    pub fn team_players(&self, number: TeamNumber) -> impl Iterator<Item = &Player> {
        self.team(number)
            .roster
            .iter()
            .filter_map(move |user| self.players.iter().find(|p| &p.user_id == user))
    }

    #[must_use]
    pub fn shop(&self, kind: ShopKind) -> &Shop {
        match kind {
            ShopKind::Creature => &self.creature_shop,
            ShopKind::Item => &self.item_shop,
        }
    }

    pub fn shop_mut(&mut self, kind: ShopKind) -> &mut Shop {
        match kind {
            ShopKind::Creature => &mut self.creature_shop,
            ShopKind::Item => &mut self.item_shop,
        }
    }

    fn require_host(&self, user: &UserId, action: &str) -> EngineResult<()> {
        if self.player(user)?.is_game_host {
            Ok(())
        } else {
            warn!(user = %user, action, "host-only action refused");
            Err(EngineError::host_only(action))
        }
    }

    // === Joining ===

    /// Add a player, or reconnect one who is already in the session.
    ///
    /// Returns true if the player is new.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn add_player(&mut self, user: UserId, connection: ConnectionId) -> EngineResult<bool> {
        if let Ok(existing) = self.player_mut(&user) {
            existing.reconnect(connection);
            info!(user = %user, "player reconnected");
            return Ok(false);
        }
        if self.is_started {
            return Err(EngineError::conflict(format!("session {} has started", self.id)));
        }
        if self.is_full() {
            return Err(EngineError::conflict(format!("session {} is full", self.id)));
        }
        let mut player = Player::new(user.clone(), connection);
        player.is_game_host = self.players.is_empty();
        self.players.push_back(player);
        info!(user = %user, players = self.players.len(), "player joined");
        Ok(true)
    }

    /// Remove a player and hand the host role to the next one.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn remove_player(&mut self, user: &UserId) -> EngineResult<Player> {
        let index = self.player_index(user)?;
        let removed = self.players.remove(index);
        self.team1.remove_player_from_team(user);
        self.team2.remove_player_from_team(user);

        if removed.is_game_host && !self.players.is_empty() {
            let next = index % self.players.len();
            self.players[next].is_game_host = true;
            info!(host = %self.players[next].user_id, "host handed over");
        }
        info!(user = %user, players = self.players.len(), "player left");
        Ok(removed)
    }

    /// Host confirms the session is complete.
    pub fn all_players_joined(&self, user: &UserId) -> EngineResult<()> {
        self.require_host(user, "close joining")?;
        if !self.is_full() {
            return Err(EngineError::validation(format!(
                "{} of {} players joined",
                self.players.len(),
                self.num_players_total
            )));
        }
        Ok(())
    }

    // === Sage selection ===

    pub fn select_sage(&mut self, user: &UserId, sage: Sage) -> EngineResult<()> {
        if let Some(owner) = self
            .players
            .iter()
            .find(|p| p.sage == Some(sage) && &p.user_id != user)
        {
            return Err(EngineError::conflict(format!(
                "{} is already taken by {}",
                sage, owner.user_id
            )));
        }
        self.player_mut(user)?.sage = Some(sage);
        debug!(user = %user, %sage, "sage selected");
        Ok(())
    }

    pub fn all_sages_selected(&self, user: &UserId) -> EngineResult<()> {
        self.require_host(user, "close sage selection")?;
        if let Some(missing) = self.players.iter().find(|p| p.sage.is_none()) {
            return Err(EngineError::validation(format!(
                "{} has not chosen a sage",
                missing.user_id
            )));
        }
        Ok(())
    }

    // === Teams ===

    /// Put the user on `number`, leaving the other team if needed.
    pub fn join_team(&mut self, user: &UserId, number: TeamNumber) -> EngineResult<()> {
        self.player_index(user)?;
        self.team_mut(number).add_player_to_team(user.clone())?;
        self.team_mut(number.opposite()).remove_player_from_team(user);
        debug!(user = %user, team = %number, "joined team");
        Ok(())
    }

    pub fn clear_teams(&mut self, user: &UserId) -> EngineResult<()> {
        self.require_host(user, "clear teams")?;
        self.team1.reset_team();
        self.team2.reset_team();
        Ok(())
    }

    pub fn all_teams_joined(&self) -> EngineResult<()> {
        if !self.team1.is_full() || !self.team2.is_full() {
            return Err(EngineError::validation("both teams must be full"));
        }
        if let Some(loose) = self.players.iter().find(|p| self.team_of(&p.user_id).is_none()) {
            return Err(EngineError::validation(format!("{} has no team", loose.user_id)));
        }
        Ok(())
    }

    pub fn toggle_ready(&mut self, user: &UserId) -> EngineResult<bool> {
        Ok(self.player_mut(user)?.toggle_ready())
    }

    /// Checks and setup behind `StartGame`: decks and battlefields.
    ///
    /// Promotion itself happens in [`Session::start_game`].
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn prepare_start(&mut self, user: &UserId) -> EngineResult<()> {
        self.require_host(user, "start the game")?;
        if self.is_started {
            return Err(EngineError::conflict("game already started"));
        }
        if !self.is_full() {
            return Err(EngineError::validation("session is not full"));
        }
        if let Some(waiting) = self.players.iter().find(|p| !p.is_ready) {
            return Err(EngineError::validation(format!("{} is not ready", waiting.user_id)));
        }
        let mut sages: Vec<Sage> = self.players.iter().filter_map(|p| p.sage).collect();
        sages.sort();
        sages.dedup();
        if sages.len() != self.players.len() {
            return Err(EngineError::validation("every player needs a distinct sage"));
        }
        self.all_teams_joined()?;

        let rules = &self.rules;
        let rng = &mut self.rng;
        for player in self.players.iter_mut() {
            player.init_deck(rules, rng)?;
        }
        for number in [TeamNumber::One, TeamNumber::Two] {
            let decklists: Vec<Decklist> = self
                .team_players(number)
                .filter_map(|p| p.decklist.clone())
                .collect();
            self.team_mut(number).init_battlefield(&decklists)?;
        }
        self.is_started = true;
        info!("decks and battlefields initialized");
        Ok(())
    }

    // === Warrior selection ===

    /// Place two of the player's warriors; the rest of the warriors and
    /// the champions are shuffled into the deck.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn choose_warriors(&mut self, user: &UserId, chosen: [CardId; 2]) -> EngineResult<()> {
        let number = self.require_team_of(user)?;
        let player = self.player(user)?;
        if player.has_chosen_warriors {
            return Err(EngineError::conflict(format!("{} already chose warriors", user)));
        }
        let decklist = player
            .decklist
            .clone()
            .ok_or_else(|| EngineError::not_found(format!("decklist of {}", user)))?;
        if chosen[0] == chosen[1] {
            return Err(EngineError::validation("choose two different warriors"));
        }
        let pick = |id: CardId| {
            decklist
                .warrior(id)
                .cloned()
                .ok_or_else(|| EngineError::validation(format!("{} is not one of your warriors", id)))
        };
        let warriors = [pick(chosen[0])?, pick(chosen[1])?];

        let index = self.player_index(user)?;
        let team = match number {
            TeamNumber::One => &mut self.team1,
            TeamNumber::Two => &mut self.team2,
        };
        team.choose_warriors(&self.players[index], warriors)?;

        let player = &mut self.players[index];
        let rest: Vec<Card> = decklist
            .warriors
            .iter()
            .filter(|w| !chosen.contains(&w.id))
            .chain(decklist.champions.iter())
            .cloned()
            .collect();
        for card in rest {
            player.add_card_to_deck(card);
        }
        self.rng.shuffle_vector(&mut player.deck);
        player.has_chosen_warriors = true;
        info!(user = %user, "warriors chosen");
        Ok(())
    }

    pub fn swap_warriors(&mut self, user: &UserId) -> EngineResult<()> {
        let number = self.require_team_of(user)?;
        let index = self.player_index(user)?;
        let team = match number {
            TeamNumber::One => &mut self.team1,
            TeamNumber::Two => &mut self.team2,
        };
        team.swap_warriors(&self.players[index])
    }

    pub fn finish_player_setup(&mut self, user: &UserId) -> EngineResult<()> {
        self.player_mut(user)?.finish_player_setup()
    }

    /// Everyone is set up: draw opening hands.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn all_players_setup_complete(&mut self) -> EngineResult<()> {
        if let Some(pending) = self.players.iter().find(|p| !p.is_setup) {
            return Err(EngineError::validation(format!(
                "{} has not finished setup",
                pending.user_id
            )));
        }
        let hand_size = self.rules.hand_size;
        for player in self.players.iter_mut() {
            player.init_hand(hand_size)?;
        }
        self.has_finished_setup = true;
        info!("setup complete, opening hands drawn");
        Ok(())
    }

    // === Shop ===

    /// Buy an offered card into the buyer's deck and restock the shop.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn buy_card(&mut self, user: &UserId, kind: ShopKind, index: usize) -> EngineResult<Card> {
        let number = self.require_team_of(user)?;
        let price = self
            .shop(kind)
            .offered_card(index)
            .map(|c| c.price)
            .ok_or_else(|| EngineError::validation(format!("{} has no card {}", kind, index)))?;
        let available = self.team(number).gold();
        if available < price {
            return Err(EngineError::NotEnoughGold {
                needed: price,
                available,
            });
        }

        let card = self.shop_mut(kind).take_offered(index)?;
        self.team_mut(number).remove_gold(price);
        self.player_mut(user)?.add_card_to_deck(card.clone());
        self.shop_mut(kind).restock();
        info!(user = %user, card = %card.name, price, "card bought");
        Ok(card)
    }
}

/// A stored session: still in setup, or promoted to a live match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Session {
    Setup(GameSession),
    Active(ActiveGameSession),
}

impl Session {
    #[must_use]
    pub fn new(game: GameSession) -> Self {
        Session::Setup(game)
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.game().id
    }

    /// The underlying session, in either state.
    #[must_use]
    pub fn game(&self) -> &GameSession {
        match self {
            Session::Setup(game) => game,
            Session::Active(active) => active.game(),
        }
    }

    pub fn game_mut(&mut self) -> &mut GameSession {
        match self {
            Session::Setup(game) => game,
            Session::Active(active) => active.game_mut(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Session::Active(_))
    }

    #[must_use]
    pub fn as_active(&self) -> Option<&ActiveGameSession> {
        match self {
            Session::Active(active) => Some(active),
            Session::Setup(_) => None,
        }
    }

    pub fn active(&self) -> EngineResult<&ActiveGameSession> {
        self.as_active().ok_or_else(|| EngineError::NotStarted {
            session: self.id().to_string(),
        })
    }

    pub fn active_mut(&mut self) -> EngineResult<&mut ActiveGameSession> {
        match self {
            Session::Active(active) => Ok(active),
            Session::Setup(game) => Err(EngineError::NotStarted {
                session: game.id.to_string(),
            }),
        }
    }

    /// Prepare the match and promote. One-way and one-time.
    pub fn start_game(&mut self, user: &UserId) -> EngineResult<()> {
        let Session::Setup(game) = self else {
            return Err(EngineError::conflict("game already started"));
        };
        game.prepare_start(user)?;
        let promoted = ActiveGameSession::promote(game.clone());
        *self = Session::Active(promoted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    fn session(total: usize) -> GameSession {
        GameSession::new(SessionSettings::new("s1", total).with_seed(9), GameRules::default())
            .unwrap()
    }

    fn join(game: &mut GameSession, users: &[&str]) {
        for user in users {
            game.add_player(UserId::from(*user), ConnectionId::from(*user)).unwrap();
        }
    }

    #[test]
    fn test_player_count_validated() {
        let err = GameSession::new(SessionSettings::new("s", 3), GameRules::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_first_player_is_host_and_reconnect() {
        let mut game = session(2);
        join(&mut game, &["a", "b"]);
        assert_eq!(game.host().map(|p| p.user_id.as_str()), Some("a"));

        let fresh = game.add_player(UserId::from("b"), ConnectionId::from("b2")).unwrap();
        assert!(!fresh);
        assert_eq!(game.player_count(), 2);
        assert_eq!(
            game.player(&UserId::from("b")).unwrap().connection_id,
            ConnectionId::from("b2")
        );

        let err = game.add_player(UserId::from("c"), ConnectionId::from("c")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_host_handover() {
        let mut game = session(4);
        join(&mut game, &["a", "b", "c"]);
        game.join_team(&UserId::from("a"), TeamNumber::One).unwrap();

        game.remove_player(&UserId::from("a")).unwrap();
        assert_eq!(game.host().map(|p| p.user_id.as_str()), Some("b"));
        assert!(game.team(TeamNumber::One).roster.is_empty());
    }

    #[test]
    fn test_sage_conflict_and_host_gate() {
        let mut game = session(2);
        join(&mut game, &["a", "b"]);
        game.select_sage(&UserId::from("a"), Sage::Pyra).unwrap();

        let err = game.select_sage(&UserId::from("b"), Sage::Pyra).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = game.all_sages_selected(&UserId::from("b")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HostOnly);
        let err = game.all_sages_selected(&UserId::from("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_join_team_moves_between_teams() {
        let mut game = session(4);
        join(&mut game, &["a"]);
        let a = UserId::from("a");

        game.join_team(&a, TeamNumber::One).unwrap();
        game.join_team(&a, TeamNumber::Two).unwrap();
        assert_eq!(game.team_of(&a), Some(TeamNumber::Two));
        assert!(!game.team(TeamNumber::One).contains(&a));

        let err = game.join_team(&UserId::from("ghost"), TeamNumber::One).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_toggle_ready() {
        let mut game = session(2);
        join(&mut game, &["a"]);
        assert_eq!(game.toggle_ready(&UserId::from("a")), Ok(true));
        assert_eq!(game.toggle_ready(&UserId::from("a")), Ok(false));
    }

    #[test]
    fn test_buy_requires_gold() {
        let mut game = session(2);
        join(&mut game, &["a", "b"]);
        let a = UserId::from("a");
        game.join_team(&a, TeamNumber::One).unwrap();

        let err = game.buy_card(&a, ShopKind::Creature, 0).unwrap_err();
        assert!(matches!(err, EngineError::NotEnoughGold { available: 0, .. }));

        game.team_mut(TeamNumber::One).add_gold(12);
        let bought = game.buy_card(&a, ShopKind::Creature, 0).unwrap();
        assert_eq!(game.shop(ShopKind::Creature).offered.len(), 3);
        assert_eq!(game.team(TeamNumber::One).gold(), 12 - bought.price);
        assert_eq!(
            game.player(&a).unwrap().deck.front().map(|c| c.id),
            Some(bought.id)
        );
    }
}
