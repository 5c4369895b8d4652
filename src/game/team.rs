//! Teams: roster, gold, battlefield and removed-card history.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::player::Player;
use crate::board::{Battlefield, BoardLayout, SlotId};
use crate::cards::{Card, Decklist, Element};
use crate::core::{EngineError, EngineResult, GameRules, UserId};

/// Which of the two teams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TeamNumber {
    One,
    Two,
}

impl TeamNumber {
    #[must_use]
    pub const fn opposite(self) -> TeamNumber {
        match self {
            TeamNumber::One => TeamNumber::Two,
            TeamNumber::Two => TeamNumber::One,
        }
    }

    /// 1 or 2.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            TeamNumber::One => 1,
            TeamNumber::Two => 2,
        }
    }

    pub fn from_number(number: u8) -> EngineResult<Self> {
        match number {
            1 => Ok(TeamNumber::One),
            2 => Ok(TeamNumber::Two),
            n => Err(EngineError::not_found(format!("team {}", n))),
        }
    }
}

impl std::fmt::Display for TeamNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "team {}", self.number())
    }
}

/// Fixed slots one player's starting cards occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SidePlacement {
    sage: SlotId,
    basic: SlotId,
    warriors: [SlotId; 2],
}

impl SidePlacement {
    const fn new(sage: u8, basic: u8, warriors: [u8; 2]) -> Self {
        Self {
            sage: SlotId::new(sage),
            basic: SlotId::new(basic),
            warriors: [SlotId::new(warriors[0]), SlotId::new(warriors[1])],
        }
    }
}

const SOLO_SIDE: SidePlacement = SidePlacement::new(1, 5, [4, 6]);
const LEFT_SIDE: SidePlacement = SidePlacement::new(1, 8, [7, 9]);
const RIGHT_SIDE: SidePlacement = SidePlacement::new(2, 11, [10, 12]);

/// A team of one or two players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_number: TeamNumber,
    pub team_size: usize,
    pub roster: im::Vector<UserId>,
    pub battlefield: Battlefield,
    gold: u32,
    max_gold: u32,
    pub removed_cards: im::Vector<Card>,
}

impl Team {
    pub fn new(team_number: TeamNumber, team_size: usize, rules: &GameRules) -> EngineResult<Self> {
        Ok(Self {
            team_number,
            team_size,
            roster: im::Vector::new(),
            battlefield: Battlefield::for_team_size(team_size)?,
            gold: 0,
            max_gold: rules.max_gold(team_size),
            removed_cards: im::Vector::new(),
        })
    }

    #[must_use]
    pub fn gold(&self) -> u32 {
        self.gold
    }

    #[must_use]
    pub fn max_gold(&self) -> u32 {
        self.max_gold
    }

    /// Add gold, capped at `max_gold`.
    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount).min(self.max_gold);
    }

    /// Remove gold, flooring at zero. Never fails.
    pub fn remove_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_sub(amount);
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.roster.len() >= self.team_size
    }

    #[must_use]
    pub fn contains(&self, user: &UserId) -> bool {
        self.roster.contains(user)
    }

    pub fn add_player_to_team(&mut self, user: UserId) -> EngineResult<()> {
        if self.contains(&user) {
            return Err(EngineError::conflict(format!(
                "{} is already on {}",
                user, self.team_number
            )));
        }
        if self.is_full() {
            return Err(EngineError::conflict(format!("{} is full", self.team_number)));
        }
        self.roster.push_back(user);
        Ok(())
    }

    /// No-op if the user is not on the team.
    pub fn remove_player_from_team(&mut self, user: &UserId) {
        self.roster.retain(|member| member != user);
    }

    /// Empty roster, zero gold, fresh battlefield, no removed cards.
    pub fn reset_team(&mut self) {
        self.roster.clear();
        self.gold = 0;
        self.battlefield = Battlefield::new(self.battlefield.layout());
        self.removed_cards.clear();
    }

    fn placement(&self, index: usize) -> EngineResult<SidePlacement> {
        match (self.battlefield.layout(), index) {
            (BoardLayout::Solo, 0) => Ok(SOLO_SIDE),
            (BoardLayout::Duo, 0) => Ok(LEFT_SIDE),
            (BoardLayout::Duo, 1) => Ok(RIGHT_SIDE),
            _ => Err(EngineError::validation(format!(
                "no starting side for player {} on {}",
                index, self.team_number
            ))),
        }
    }

    /// Side whose sage anchor holds the sage of `element`.
    fn side_of(&self, element: Element) -> EngineResult<SidePlacement> {
        let holds_sage = |placement: &SidePlacement| {
            matches!(
                self.battlefield.get_card(placement.sage),
                Ok(Some(card)) if card.is_sage() && card.element() == Some(element)
            )
        };
        let candidates: &[SidePlacement] = match self.battlefield.layout() {
            BoardLayout::Solo => &[SOLO_SIDE],
            BoardLayout::Duo => &[LEFT_SIDE, RIGHT_SIDE],
        };
        candidates
            .iter()
            .copied()
            .find(holds_sage)
            .ok_or_else(|| EngineError::not_found(format!("{} sage on {}", element, self.team_number)))
    }

    /// Fresh battlefield with each player's sage and basic card placed.
    ///
    /// `decklists` are in roster order; index 0 takes the left side.
    pub fn init_battlefield(&mut self, decklists: &[Decklist]) -> EngineResult<()> {
        let mut battlefield = Battlefield::new(self.battlefield.layout());
        for (index, decklist) in decklists.iter().enumerate() {
            let side = self.placement(index)?;
            battlefield.add_card(decklist.sage_card.clone(), side.sage)?;
            battlefield.add_card(decklist.basic.clone(), side.basic)?;
        }
        self.battlefield = battlefield;
        debug!(team = %self.team_number, players = decklists.len(), "battlefield initialized");
        Ok(())
    }

    /// Place two warriors on the side of `player`'s sage.
    pub fn choose_warriors(&mut self, player: &Player, warriors: [Card; 2]) -> EngineResult<()> {
        let sage = player
            .sage
            .ok_or_else(|| EngineError::not_found(format!("sage of {}", player.user_id)))?;
        let side = self.side_of(sage.element())?;
        for slot in side.warriors {
            if self.battlefield.get_card(slot)?.is_some() {
                return Err(EngineError::conflict(format!("{} already holds a warrior", slot)));
            }
        }
        let [first, second] = warriors;
        self.battlefield.add_card(first, side.warriors[0])?;
        self.battlefield.add_card(second, side.warriors[1])?;
        Ok(())
    }

    /// Swap the two warrior slots on `player`'s side.
    pub fn swap_warriors(&mut self, player: &Player) -> EngineResult<()> {
        let element = player
            .decklist
            .as_ref()
            .map(Decklist::element)
            .ok_or_else(|| EngineError::not_found(format!("decklist of {}", player.user_id)))?;
        let side = self.side_of(element)?;
        self.battlefield.swap_cards(side.warriors[0], side.warriors[1])
    }

    pub fn record_removed(&mut self, card: Card) {
        self.removed_cards.push_back(card);
    }

    /// Number of sage cards still on the battlefield.
    #[must_use]
    pub fn sage_count_on_field(&self) -> usize {
        self.battlefield.cards().filter(|(_, card)| card.is_sage()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Sage;
    use crate::core::{ConnectionId, ErrorKind};

    fn team(size: usize) -> Team {
        Team::new(TeamNumber::One, size, &GameRules::default()).unwrap()
    }

    fn player_with(user: &str, sage: Sage) -> Player {
        let mut player = Player::new(UserId::from(user), ConnectionId::from(user));
        player.sage = Some(sage);
        player.decklist = Some(Decklist::for_sage(sage));
        player
    }

    #[test]
    fn test_gold_clamps() {
        let mut solo = team(1);
        solo.add_gold(50);
        assert_eq!(solo.gold(), 12);
        solo.remove_gold(100);
        assert_eq!(solo.gold(), 0);

        let mut duo = team(2);
        duo.add_gold(19);
        duo.add_gold(5);
        assert_eq!(duo.gold(), 20);
    }

    #[test]
    fn test_roster_limits() {
        let mut solo = team(1);
        solo.add_player_to_team(UserId::from("a")).unwrap();

        let err = solo.add_player_to_team(UserId::from("b")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = solo.add_player_to_team(UserId::from("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        solo.remove_player_from_team(&UserId::from("zzz"));
        assert_eq!(solo.roster.len(), 1);
        solo.remove_player_from_team(&UserId::from("a"));
        assert!(solo.roster.is_empty());
    }

    #[test]
    fn test_reset_team() {
        let mut duo = team(2);
        duo.add_player_to_team(UserId::from("a")).unwrap();
        duo.add_gold(5);
        duo.init_battlefield(&[Decklist::for_sage(Sage::Pyra)]).unwrap();

        duo.reset_team();
        assert!(duo.roster.is_empty());
        assert_eq!(duo.gold(), 0);
        assert!(duo.battlefield.is_empty());
        assert_eq!(duo.battlefield.len(), 12);
    }

    #[test]
    fn test_init_battlefield_duo_sides() {
        let mut duo = team(2);
        let lists = [Decklist::for_sage(Sage::Pyra), Decklist::for_sage(Sage::Maris)];
        duo.init_battlefield(&lists).unwrap();

        let at = |n| duo.battlefield.get_card(SlotId::new(n)).unwrap().map(|c| c.id);
        assert_eq!(at(1), Some(lists[0].sage_card.id));
        assert_eq!(at(8), Some(lists[0].basic.id));
        assert_eq!(at(2), Some(lists[1].sage_card.id));
        assert_eq!(at(11), Some(lists[1].basic.id));
        assert_eq!(duo.sage_count_on_field(), 2);
    }

    #[test]
    fn test_choose_and_swap_warriors_right_side() {
        let mut duo = team(2);
        let left = player_with("a", Sage::Pyra);
        let right = player_with("b", Sage::Terran);
        duo.init_battlefield(&[
            left.decklist.clone().unwrap(),
            right.decklist.clone().unwrap(),
        ])
        .unwrap();

        let list = right.decklist.clone().unwrap();
        duo.choose_warriors(&right, [list.warriors[0].clone(), list.warriors[1].clone()])
            .unwrap();

        let at = |t: &Team, n| t.battlefield.get_card(SlotId::new(n)).unwrap().map(|c| c.id);
        assert_eq!(at(&duo, 10), Some(list.warriors[0].id));
        assert_eq!(at(&duo, 12), Some(list.warriors[1].id));

        duo.swap_warriors(&right).unwrap();
        assert_eq!(at(&duo, 10), Some(list.warriors[1].id));
        assert_eq!(at(&duo, 12), Some(list.warriors[0].id));
    }

    #[test]
    fn test_choose_warriors_without_sage_on_field() {
        let mut solo = team(1);
        let player = player_with("a", Sage::Zephyr);
        let list = player.decklist.clone().unwrap();

        let err = solo
            .choose_warriors(&player, [list.warriors[0].clone(), list.warriors[1].clone()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
