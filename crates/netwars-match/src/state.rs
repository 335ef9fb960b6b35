//! The authoritative match: both players' boards, hands, and the turn.
//!
//! Every operation takes `&mut self` and returns the messages to send as
//! `(Recipient, ServerMessage)` pairs. The caller holds the lock and does
//! the delivery; nothing here touches a socket.

use std::collections::HashSet;

use netwars_protocol::{PlayerId, Recipient};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    Card, CardCatalog, CardRef, ClientMessage, Coord, Fleet, HAND_CAPACITY,
    MatchError, ServerMessage,
};

/// One outbound message and who gets it.
pub type Outbound = (Recipient, ServerMessage);

/// Where the match is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for one or both fleets.
    Placement,
    /// Fleets placed; players alternate turns.
    InProgress,
    /// Someone won. Nothing else is accepted.
    Finished,
}

/// Everything the match tracks for one seat.
#[derive(Debug, Default)]
struct Side {
    fleet: Option<Fleet>,
    hand: Vec<Card>,
    /// Cells this player has shot at. Scans do not count.
    attacked: HashSet<Coord>,
    /// Cells of this player's board exposed by the opponent's scans.
    revealed: HashSet<Coord>,
    disconnected: bool,
}

/// A two-player match.
pub struct MatchState {
    players: [PlayerId; 2],
    sides: [Side; 2],
    phase: Phase,
    /// Seat index of the player to move.
    turn: Option<usize>,
    winner: Option<PlayerId>,
    catalog: CardCatalog,
    rng: StdRng,
}

impl MatchState {
    /// Creates a match seeded from the OS.
    pub fn new(players: [PlayerId; 2]) -> Self {
        Self::with_rng(players, StdRng::from_os_rng())
    }

    /// Creates a match with a deterministic first-player pick and draws.
    pub fn with_seed(players: [PlayerId; 2], seed: u64) -> Self {
        Self::with_rng(players, StdRng::seed_from_u64(seed))
    }

    fn with_rng(players: [PlayerId; 2], rng: StdRng) -> Self {
        tracing::info!(player_a = %players[0], player_b = %players[1], "match created");
        Self {
            players,
            sides: Default::default(),
            phase: Phase::Placement,
            turn: None,
            winner: None,
            catalog: CardCatalog::standard(),
            rng,
        }
    }

    // -- Dispatch ---------------------------------------------------------

    /// Routes one client message.
    ///
    /// Rule violations are logged and produce no output, except an invalid
    /// placement, which is answered with `invalid_placement`. A player
    /// still flagged disconnected may only send `reconnect`.
    pub fn handle_message(&mut self, sender: &PlayerId, msg: ClientMessage) -> Vec<Outbound> {
        let result = match msg {
            ClientMessage::Reconnect => self.reconnect(sender),
            _ if self.is_disconnected(sender) => {
                tracing::debug!(player_id = %sender, "ignoring message from disconnected player");
                return Vec::new();
            }
            ClientMessage::Placement { ships } => self.submit_placement(sender, ships),
            ClientMessage::Attack { row, col, card } => {
                self.resolve_attack(sender, Coord(row, col), card)
            }
            ClientMessage::DrawCard => self.draw_card(sender),
        };

        match result {
            Ok(out) => out,
            Err(MatchError::InvalidPlacement(e)) => {
                tracing::debug!(player_id = %sender, error = %e, "placement rejected");
                vec![(Recipient::Player(sender.clone()), ServerMessage::InvalidPlacement)]
            }
            Err(e) => {
                tracing::debug!(player_id = %sender, error = %e, "message ignored");
                Vec::new()
            }
        }
    }

    // -- Placement --------------------------------------------------------

    /// Stores a player's fleet. Once both are in, picks a random first
    /// player and broadcasts `game_start`.
    ///
    /// # Errors
    /// Leaves state untouched on any error. A second placement from the
    /// same player is [`MatchError::AlreadyPlaced`].
    pub fn submit_placement(
        &mut self,
        player: &PlayerId,
        ships: Vec<Vec<Coord>>,
    ) -> Result<Vec<Outbound>, MatchError> {
        let seat = self.seat(player)?;
        if self.phase != Phase::Placement {
            return Err(MatchError::WrongPhase(self.phase));
        }
        if self.sides[seat].fleet.is_some() {
            return Err(MatchError::AlreadyPlaced(player.clone()));
        }

        let fleet = Fleet::from_placement(ships)?;
        self.sides[seat].fleet = Some(fleet);
        tracing::info!(player_id = %player, "fleet placed");

        if self.sides.iter().any(|side| side.fleet.is_none()) {
            return Ok(Vec::new());
        }

        let first = self.rng.random_range(0..2);
        self.phase = Phase::InProgress;
        self.turn = Some(first);
        let current_player = self.players[first].clone();
        tracing::info!(%current_player, "game started");

        Ok(vec![(Recipient::All, ServerMessage::GameStart { current_player })])
    }

    // -- Attack -----------------------------------------------------------

    /// Plays `card` (a standard shot if `None`) on `target`.
    ///
    /// # Errors
    /// Fails without side effects when the match is not in progress, it
    /// is not `attacker`'s turn, or `target` is off the board or already
    /// attacked.
    pub fn resolve_attack(
        &mut self,
        attacker: &PlayerId,
        target: Coord,
        card: Option<CardRef>,
    ) -> Result<Vec<Outbound>, MatchError> {
        let seat = self.seat(attacker)?;
        if self.phase != Phase::InProgress {
            return Err(MatchError::WrongPhase(self.phase));
        }
        if self.turn != Some(seat) {
            return Err(MatchError::NotYourTurn(attacker.clone()));
        }
        if !target.in_bounds() {
            return Err(MatchError::OutOfBounds(target));
        }
        if self.sides[seat].attacked.contains(&target) {
            return Err(MatchError::AlreadyAttacked(target));
        }

        let card = card.unwrap_or_default();
        let effect = card.effect;
        let defender_seat = 1 - seat;
        let defender = self.players[defender_seat].clone();
        let mut out = Vec::new();

        let (own, theirs) = pair_mut(&mut self.sides, seat);
        let Some(fleet) = theirs.fleet.as_mut() else {
            return Err(MatchError::WrongPhase(self.phase));
        };

        if let Some(name) = card.name.as_deref() {
            if let Some(card_name) = spend_card(&mut own.hand, name) {
                out.push((
                    Recipient::Player(attacker.clone()),
                    ServerMessage::RemoveCard { card_name },
                ));
            }
        }

        let area = effect.affected_cells(target);
        let (coords, hits): (Vec<Coord>, Vec<bool>) = if effect.deals_damage() {
            let fresh: Vec<Coord> = area
                .iter()
                .copied()
                .filter(|cell| !own.attacked.contains(cell))
                .collect();
            own.attacked.extend(area.iter().copied());
            let hits = fresh.iter().map(|&cell| fleet.strike(cell)).collect();
            (fresh, hits)
        } else {
            // Scanned cells stay open to later shots.
            let hits = area.iter().map(|&cell| fleet.occupies(cell)).collect();
            (area.clone(), hits)
        };

        if fleet.is_destroyed() {
            self.phase = Phase::Finished;
            self.winner = Some(attacker.clone());
            tracing::info!(winner = %attacker, "fleet destroyed, game over");
            out.push((
                Recipient::All,
                ServerMessage::GameOver {
                    winner: attacker.clone(),
                    message: format!("{attacker} destroyed all ships!"),
                },
            ));
            return Ok(out);
        }

        if effect.reveals() {
            theirs.revealed.extend(area.iter().copied());
        }
        if effect.disables_next_turn() {
            out.push((
                Recipient::All,
                ServerMessage::SpecialEffect { effect, player: defender.clone() },
            ));
        }

        self.turn = Some(defender_seat);
        out.push((
            Recipient::All,
            ServerMessage::AttackResult {
                player: attacker.clone(),
                coords,
                hits,
                special_effect: effect,
            },
        ));
        out.push((Recipient::All, ServerMessage::TurnUpdate { current_player: defender }));
        Ok(out)
    }

    // -- Draw -------------------------------------------------------------

    /// Draws a random card into `player`'s hand and ends their turn.
    ///
    /// # Errors
    /// Fails without side effects when the match is not in progress, it is
    /// not `player`'s turn, or their hand is full.
    pub fn draw_card(&mut self, player: &PlayerId) -> Result<Vec<Outbound>, MatchError> {
        let seat = self.seat(player)?;
        if self.phase != Phase::InProgress {
            return Err(MatchError::WrongPhase(self.phase));
        }
        if self.turn != Some(seat) {
            return Err(MatchError::NotYourTurn(player.clone()));
        }
        if self.sides[seat].hand.len() >= HAND_CAPACITY {
            return Err(MatchError::HandFull(player.clone()));
        }

        let card = self.catalog.draw(&mut self.rng);
        let side = &mut self.sides[seat];
        side.hand.push(card.clone());

        let next = 1 - seat;
        self.turn = Some(next);
        tracing::debug!(player_id = %player, card = %card.name, "card drawn");

        let me = Recipient::Player(player.clone());
        Ok(vec![
            (me.clone(), ServerMessage::NewCard { card }),
            (me, ServerMessage::DisableDraw),
            (
                Recipient::All,
                ServerMessage::TurnUpdate { current_player: self.players[next].clone() },
            ),
        ])
    }

    // -- Connection lifecycle ---------------------------------------------

    /// Flags `player` as disconnected. Their messages are ignored until
    /// they send `reconnect`.
    pub fn player_disconnected(&mut self, player: &PlayerId) {
        if let Ok(seat) = self.seat(player) {
            self.sides[seat].disconnected = true;
        }
    }

    /// Clears the disconnected flag, announces the return, and sends the
    /// player a snapshot of their fleet, hand, and the current turn.
    ///
    /// # Errors
    /// [`MatchError::NotDisconnected`] if the player was not flagged.
    pub fn reconnect(&mut self, player: &PlayerId) -> Result<Vec<Outbound>, MatchError> {
        let seat = self.seat(player)?;
        let side = &mut self.sides[seat];
        if !side.disconnected {
            return Err(MatchError::NotDisconnected(player.clone()));
        }
        side.disconnected = false;

        let snapshot = ServerMessage::GameStateUpdate {
            ships: side.fleet.clone().unwrap_or_default(),
            hand: side.hand.clone(),
            current_turn: self.current_turn().cloned(),
        };
        tracing::info!(player_id = %player, "player rejoined match");

        Ok(vec![
            (Recipient::All, ServerMessage::ReconnectSuccess { username: player.clone() }),
            (Recipient::Player(player.clone()), snapshot),
        ])
    }

    /// Ends the match in the opponent's favour after `player`'s grace
    /// period ran out.
    ///
    /// # Errors
    /// [`MatchError::WrongPhase`] if the match is already finished.
    pub fn forfeit(&mut self, player: &PlayerId) -> Result<Vec<Outbound>, MatchError> {
        let seat = self.seat(player)?;
        if self.phase == Phase::Finished {
            return Err(MatchError::WrongPhase(self.phase));
        }

        self.sides[seat].disconnected = false;
        let winner = self.players[1 - seat].clone();
        self.phase = Phase::Finished;
        self.winner = Some(winner.clone());
        tracing::info!(player_id = %player, %winner, "match forfeited");

        Ok(vec![(
            Recipient::All,
            ServerMessage::GameOver {
                winner,
                message: format!("{player} disconnected. Game over!"),
            },
        )])
    }

    // -- Accessors --------------------------------------------------------

    pub fn players(&self) -> &[PlayerId; 2] {
        &self.players
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn current_turn(&self) -> Option<&PlayerId> {
        self.turn.map(|seat| &self.players[seat])
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn fleet(&self, player: &PlayerId) -> Option<&Fleet> {
        self.side(player).and_then(|side| side.fleet.as_ref())
    }

    pub fn hand(&self, player: &PlayerId) -> &[Card] {
        self.side(player)
            .map(|side| side.hand.as_slice())
            .unwrap_or_default()
    }

    /// Cells `player` has targeted.
    pub fn attacked(&self, player: &PlayerId) -> Option<&HashSet<Coord>> {
        self.side(player).map(|side| &side.attacked)
    }

    /// Cells of `player`'s board revealed to the opponent.
    pub fn revealed(&self, player: &PlayerId) -> Option<&HashSet<Coord>> {
        self.side(player).map(|side| &side.revealed)
    }

    pub fn is_disconnected(&self, player: &PlayerId) -> bool {
        self.side(player).is_some_and(|side| side.disconnected)
    }

    fn seat(&self, player: &PlayerId) -> Result<usize, MatchError> {
        self.players
            .iter()
            .position(|p| p == player)
            .ok_or_else(|| MatchError::UnknownPlayer(player.clone()))
    }

    fn side(&self, player: &PlayerId) -> Option<&Side> {
        self.seat(player).ok().map(|seat| &self.sides[seat])
    }
}

/// Spends one play of the held card called `name`. A card with several
/// `uses` left stays in hand with one fewer; otherwise it leaves the hand and
/// its name is returned.
fn spend_card(hand: &mut Vec<Card>, name: &str) -> Option<String> {
    let index = hand.iter().position(|held| held.name == name)?;
    match hand[index].uses {
        Some(left) if left > 1 => {
            hand[index].uses = Some(left - 1);
            None
        }
        _ => Some(hand.remove(index).name),
    }
}

/// Borrows `first`'s side and the other side mutably at once.
fn pair_mut(sides: &mut [Side; 2], first: usize) -> (&mut Side, &mut Side) {
    let [zero, one] = sides;
    if first == 0 { (zero, one) } else { (one, zero) }
}

#[cfg(test)]
mod tests {
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use super::*;
    use crate::{Effect, FLEET_TEMPLATE};

    fn alice() -> PlayerId {
        PlayerId::new("alice")
    }

    fn bob() -> PlayerId {
        PlayerId::new("bob")
    }

    /// Ship `i` on row `offset + i`, starting at column 0.
    fn fleet_at(offset: i32) -> Vec<Vec<Coord>> {
        FLEET_TEMPLATE
            .iter()
            .enumerate()
            .map(|(i, &len)| (0..len as i32).map(|c| Coord(offset + i as i32, c)).collect())
            .collect()
    }

    /// Both fleets placed with alice on rows 0-4 and bob on rows 5-9;
    /// alice to move.
    fn started() -> MatchState {
        let mut state = MatchState::with_seed([alice(), bob()], 1);
        state.submit_placement(&alice(), fleet_at(0)).unwrap();
        state.submit_placement(&bob(), fleet_at(5)).unwrap();
        state.turn = Some(0);
        state
    }

    fn card(effect: Effect) -> Option<CardRef> {
        Some(CardRef { name: None, effect })
    }

    fn held(name: &str, effect: Effect) -> Card {
        limited(name, effect, None)
    }

    fn limited(name: &str, effect: Effect, uses: Option<u32>) -> Card {
        Card {
            name: name.into(),
            description: String::new(),
            effect,
            uses,
        }
    }

    fn named(name: &str, effect: Effect) -> Option<CardRef> {
        Some(CardRef { name: Some(name.into()), effect })
    }

    // =====================================================================
    // submit_placement()
    // =====================================================================

    #[test]
    fn test_submit_placement_first_fleet_waits_for_opponent() {
        let mut state = MatchState::with_seed([alice(), bob()], 1);

        let out = state.submit_placement(&alice(), fleet_at(0)).unwrap();

        assert!(out.is_empty());
        assert_eq!(state.phase(), Phase::Placement);
        assert!(state.fleet(&alice()).is_some());
    }

    #[test]
    fn test_submit_placement_second_fleet_starts_game() {
        let mut state = MatchState::with_seed([alice(), bob()], 1);
        state.submit_placement(&alice(), fleet_at(0)).unwrap();

        let out = state.submit_placement(&bob(), fleet_at(5)).unwrap();

        assert_eq!(state.phase(), Phase::InProgress);
        let first = state.current_turn().cloned().unwrap();
        assert_eq!(
            out,
            vec![(Recipient::All, ServerMessage::GameStart { current_player: first })]
        );
    }

    #[test]
    fn test_submit_placement_resubmission_is_rejected() {
        let mut state = MatchState::with_seed([alice(), bob()], 1);
        state.submit_placement(&alice(), fleet_at(0)).unwrap();

        let result = state.submit_placement(&alice(), fleet_at(5));

        assert!(matches!(result, Err(MatchError::AlreadyPlaced(_))));
        assert!(state.fleet(&alice()).unwrap().occupies(Coord(0, 0)));
    }

    #[test]
    fn test_handle_message_invalid_placement_unicasts_rejection() {
        let mut state = MatchState::with_seed([alice(), bob()], 1);

        let out = state.handle_message(&alice(), ClientMessage::Placement { ships: vec![] });

        assert_eq!(
            out,
            vec![(Recipient::Player(alice()), ServerMessage::InvalidPlacement)]
        );
        assert!(state.fleet(&alice()).is_none());
    }

    #[test]
    fn test_submit_placement_first_player_varies_with_seed() {
        let mut seen = HashSet::new();
        for seed in 0..64 {
            let mut state = MatchState::with_seed([alice(), bob()], seed);
            state.submit_placement(&alice(), fleet_at(0)).unwrap();
            state.submit_placement(&bob(), fleet_at(5)).unwrap();
            seen.insert(state.current_turn().cloned().unwrap());
        }
        assert_eq!(seen.len(), 2);
    }

    // =====================================================================
    // resolve_attack()
    // =====================================================================

    #[test]
    fn test_resolve_attack_hit_strikes_and_passes_turn() {
        let mut state = started();

        let out = state.resolve_attack(&alice(), Coord(5, 0), None).unwrap();

        assert_eq!(
            out,
            vec![
                (
                    Recipient::All,
                    ServerMessage::AttackResult {
                        player: alice(),
                        coords: vec![Coord(5, 0)],
                        hits: vec![true],
                        special_effect: Effect::Single,
                    }
                ),
                (Recipient::All, ServerMessage::TurnUpdate { current_player: bob() }),
            ]
        );
        assert!(!state.fleet(&bob()).unwrap().occupies(Coord(5, 0)));
        assert_eq!(state.current_turn(), Some(&bob()));
    }

    #[test]
    fn test_resolve_attack_out_of_turn_is_noop() {
        let mut state = started();

        let result = state.resolve_attack(&bob(), Coord(0, 0), None);

        assert!(matches!(result, Err(MatchError::NotYourTurn(_))));
        assert!(state.fleet(&alice()).unwrap().occupies(Coord(0, 0)));
        assert!(state.attacked(&bob()).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_attack_repeat_target_is_noop() {
        let mut state = started();
        state.resolve_attack(&alice(), Coord(9, 9), None).unwrap();
        state.resolve_attack(&bob(), Coord(9, 9), None).unwrap();

        let result = state.resolve_attack(&alice(), Coord(9, 9), None);

        assert!(matches!(result, Err(MatchError::AlreadyAttacked(_))));
        assert_eq!(state.current_turn(), Some(&alice()));
    }

    #[test]
    fn test_resolve_attack_off_board_is_noop() {
        let mut state = started();

        let result = state.resolve_attack(&alice(), Coord(10, 3), None);

        assert!(matches!(result, Err(MatchError::OutOfBounds(_))));
        assert_eq!(state.current_turn(), Some(&alice()));
    }

    #[test]
    fn test_resolve_attack_before_game_start_is_rejected() {
        let mut state = MatchState::with_seed([alice(), bob()], 1);

        let result = state.resolve_attack(&alice(), Coord(0, 0), None);

        assert!(matches!(result, Err(MatchError::WrongPhase(Phase::Placement))));
    }

    #[test]
    fn test_resolve_attack_bombardment_on_open_water_misses() {
        let mut state = started();

        let out = state
            .resolve_attack(&alice(), Coord(6, 6), card(Effect::Bombardment))
            .unwrap();

        let ServerMessage::AttackResult { coords, hits, .. } = &out[0].1 else {
            panic!("expected attack_result, got {out:?}");
        };
        assert_eq!(coords.len(), 9);
        assert!(hits.iter().all(|hit| !hit));
        assert_eq!(state.attacked(&alice()).unwrap().len(), 9);
    }

    #[test]
    fn test_resolve_attack_area_skips_cells_already_attacked() {
        let mut state = started();
        state.resolve_attack(&alice(), Coord(5, 1), None).unwrap();
        state.resolve_attack(&bob(), Coord(9, 9), None).unwrap();

        let out = state
            .resolve_attack(&alice(), Coord(5, 2), card(Effect::Horizontal))
            .unwrap();

        let ServerMessage::AttackResult { coords, hits, .. } = &out[0].1 else {
            panic!("expected attack_result, got {out:?}");
        };
        assert_eq!(coords, &vec![Coord(5, 2), Coord(5, 3)]);
        assert_eq!(hits, &vec![true, true]);
    }

    #[test]
    fn test_resolve_attack_named_card_is_removed_from_hand() {
        let mut state = started();
        state.sides[0].hand = vec![held("Standard", Effect::Single), held("Vertical", Effect::Vertical)];

        let out = state
            .resolve_attack(
                &alice(),
                Coord(7, 7),
                Some(CardRef { name: Some("Vertical".into()), effect: Effect::Vertical }),
            )
            .unwrap();

        assert_eq!(
            out[0],
            (
                Recipient::Player(alice()),
                ServerMessage::RemoveCard { card_name: "Vertical".into() }
            )
        );
        assert_eq!(state.hand(&alice()).len(), 1);
        assert_eq!(state.hand(&alice())[0].name, "Standard");
    }

    #[test]
    fn test_resolve_attack_card_not_in_hand_still_resolves() {
        let mut state = started();

        let out = state
            .resolve_attack(
                &alice(),
                Coord(7, 7),
                Some(CardRef { name: Some("Vertical".into()), effect: Effect::Vertical }),
            )
            .unwrap();

        assert!(matches!(out[0].1, ServerMessage::AttackResult { .. }));
        assert_eq!(state.attacked(&alice()).unwrap().len(), 3);
    }

    #[test]
    fn test_resolve_attack_recon_reports_without_damage() {
        let mut state = started();

        let out = state.resolve_attack(&alice(), Coord(6, 1), card(Effect::Recon)).unwrap();

        let ServerMessage::AttackResult { coords, hits, .. } = &out[0].1 else {
            panic!("expected attack_result, got {out:?}");
        };
        assert_eq!(coords.len(), 9);
        assert_eq!(hits.iter().filter(|&&hit| hit).count(), 9);
        assert!(state.fleet(&bob()).unwrap().occupies(Coord(6, 1)));
        assert_eq!(state.revealed(&bob()).unwrap().len(), 9);
        assert!(state.attacked(&alice()).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_attack_scanned_cell_can_still_be_shot() {
        let mut state = started();
        state.resolve_attack(&alice(), Coord(6, 1), card(Effect::Recon)).unwrap();
        state.resolve_attack(&bob(), Coord(9, 9), None).unwrap();

        let out = state.resolve_attack(&alice(), Coord(6, 1), None).unwrap();

        let ServerMessage::AttackResult { coords, hits, .. } = &out[0].1 else {
            panic!("expected attack_result, got {out:?}");
        };
        assert_eq!(coords, &vec![Coord(6, 1)]);
        assert_eq!(hits, &vec![true]);
        assert!(!state.fleet(&bob()).unwrap().occupies(Coord(6, 1)));
    }

    #[test]
    fn test_resolve_attack_bombardment_after_recon_strikes_scanned_cells() {
        let mut state = started();
        state.resolve_attack(&alice(), Coord(6, 1), card(Effect::Recon)).unwrap();
        state.resolve_attack(&bob(), Coord(9, 9), None).unwrap();

        let out = state
            .resolve_attack(&alice(), Coord(6, 1), card(Effect::Bombardment))
            .unwrap();

        let ServerMessage::AttackResult { coords, hits, .. } = &out[0].1 else {
            panic!("expected attack_result, got {out:?}");
        };
        assert_eq!(coords.len(), 9);
        assert!(hits.iter().all(|&hit| hit));
        assert!(!state.fleet(&bob()).unwrap().occupies(Coord(5, 0)));
    }

    #[test]
    fn test_resolve_attack_recon_then_sinking_every_cell_wins() {
        let mut state = started();
        state.resolve_attack(&alice(), Coord(6, 1), card(Effect::Recon)).unwrap();
        state.turn = Some(0);

        let cells: Vec<Coord> = fleet_at(5).into_iter().flatten().collect();
        let mut last = Vec::new();
        for (i, &cell) in cells.iter().enumerate() {
            last = state.resolve_attack(&alice(), cell, None).unwrap();
            state.resolve_attack(&bob(), Coord(9, i as i32 % 10), None).ok();
            state.turn = Some(0);
        }

        assert_eq!(
            last,
            vec![(
                Recipient::All,
                ServerMessage::GameOver {
                    winner: alice(),
                    message: "alice destroyed all ships!".into(),
                }
            )]
        );
        assert!(state.is_finished());
    }

    #[test]
    fn test_resolve_attack_sonar_damages_and_reveals() {
        let mut state = started();

        state.resolve_attack(&alice(), Coord(5, 6), card(Effect::Sonar)).unwrap();

        assert!(!state.fleet(&bob()).unwrap().occupies(Coord(5, 4)));
        assert_eq!(state.phase(), Phase::InProgress);
        assert_eq!(state.revealed(&bob()).unwrap().len(), 25);
    }

    #[test]
    fn test_resolve_attack_second_held_sonar_still_plays() {
        let mut state = started();
        state.sides[0].hand = vec![
            limited("Sonar Ping", Effect::Sonar, Some(1)),
            limited("Sonar Ping", Effect::Sonar, Some(1)),
        ];
        state.resolve_attack(&alice(), Coord(9, 9), named("Sonar Ping", Effect::Sonar)).unwrap();
        state.resolve_attack(&bob(), Coord(9, 9), None).unwrap();

        let out = state
            .resolve_attack(&alice(), Coord(0, 9), named("Sonar Ping", Effect::Sonar))
            .unwrap();

        assert_eq!(
            out[0],
            (
                Recipient::Player(alice()),
                ServerMessage::RemoveCard { card_name: "Sonar Ping".into() }
            )
        );
        assert!(state.hand(&alice()).is_empty());
        assert_eq!(state.current_turn(), Some(&bob()));
    }

    #[test]
    fn test_resolve_attack_recon_card_keeps_remaining_use() {
        let mut state = started();
        state.sides[0].hand = vec![limited("Recon Drone", Effect::Recon, Some(2))];

        let out = state
            .resolve_attack(&alice(), Coord(1, 8), named("Recon Drone", Effect::Recon))
            .unwrap();

        assert!(matches!(out[0].1, ServerMessage::AttackResult { .. }));
        assert_eq!(state.hand(&alice())[0].uses, Some(1));

        state.resolve_attack(&bob(), Coord(9, 9), None).unwrap();
        let out = state
            .resolve_attack(&alice(), Coord(3, 8), named("Recon Drone", Effect::Recon))
            .unwrap();

        assert_eq!(
            out[0],
            (
                Recipient::Player(alice()),
                ServerMessage::RemoveCard { card_name: "Recon Drone".into() }
            )
        );
        assert!(state.hand(&alice()).is_empty());
    }

    #[test]
    fn test_resolve_attack_emp_broadcasts_notice_to_defender() {
        let mut state = started();

        let out = state.resolve_attack(&alice(), Coord(9, 9), card(Effect::Emp)).unwrap();

        assert_eq!(
            out[0],
            (
                Recipient::All,
                ServerMessage::SpecialEffect { effect: Effect::Emp, player: bob() }
            )
        );
        assert_eq!(state.current_turn(), Some(&bob()));
    }

    #[test]
    fn test_resolve_attack_after_emp_defender_attack_resolves() {
        let mut state = started();
        state.resolve_attack(&alice(), Coord(9, 9), card(Effect::Emp)).unwrap();

        let out = state.resolve_attack(&bob(), Coord(0, 0), None).unwrap();

        assert_eq!(
            out[0],
            (
                Recipient::All,
                ServerMessage::AttackResult {
                    player: bob(),
                    coords: vec![Coord(0, 0)],
                    hits: vec![true],
                    special_effect: Effect::Single,
                }
            )
        );
        assert!(!state.fleet(&alice()).unwrap().occupies(Coord(0, 0)));
        assert_eq!(state.current_turn(), Some(&alice()));
    }

    #[test]
    fn test_resolve_attack_sinking_last_ship_ends_match() {
        let mut state = started();
        let cells: Vec<Coord> = fleet_at(5).into_iter().flatten().collect();
        let (last, rest) = cells.split_last().unwrap();
        for (i, &cell) in rest.iter().enumerate() {
            state.resolve_attack(&alice(), cell, None).unwrap();
            state.resolve_attack(&bob(), Coord(9, i as i32 % 10), None).ok();
            state.turn = Some(0);
        }

        let out = state.resolve_attack(&alice(), *last, card(Effect::Emp)).unwrap();

        assert_eq!(
            out,
            vec![(
                Recipient::All,
                ServerMessage::GameOver {
                    winner: alice(),
                    message: "alice destroyed all ships!".into(),
                }
            )]
        );
        assert!(state.is_finished());
        assert_eq!(state.winner(), Some(&alice()));
        assert!(matches!(
            state.resolve_attack(&bob(), Coord(0, 0), None),
            Err(MatchError::WrongPhase(Phase::Finished))
        ));
    }

    // =====================================================================
    // draw_card()
    // =====================================================================

    #[test]
    fn test_draw_card_adds_card_and_ends_turn() {
        let mut state = started();

        let out = state.draw_card(&alice()).unwrap();

        assert_eq!(state.hand(&alice()).len(), 1);
        let drawn = state.hand(&alice())[0].clone();
        assert_eq!(
            out,
            vec![
                (Recipient::Player(alice()), ServerMessage::NewCard { card: drawn }),
                (Recipient::Player(alice()), ServerMessage::DisableDraw),
                (Recipient::All, ServerMessage::TurnUpdate { current_player: bob() }),
            ]
        );
        assert_eq!(state.current_turn(), Some(&bob()));
    }

    #[test]
    fn test_draw_card_full_hand_is_noop() {
        let mut state = started();
        state.sides[0].hand = vec![held("Standard", Effect::Single); HAND_CAPACITY];

        let result = state.draw_card(&alice());

        assert!(matches!(result, Err(MatchError::HandFull(_))));
        assert_eq!(state.hand(&alice()).len(), HAND_CAPACITY);
        assert_eq!(state.current_turn(), Some(&alice()));
    }

    #[test]
    fn test_draw_card_out_of_turn_is_noop() {
        let mut state = started();

        assert!(matches!(state.draw_card(&bob()), Err(MatchError::NotYourTurn(_))));
        assert!(state.hand(&bob()).is_empty());
    }

    // =====================================================================
    // Disconnect / reconnect / forfeit
    // =====================================================================

    #[test]
    fn test_handle_message_from_disconnected_player_is_ignored() {
        let mut state = started();
        state.player_disconnected(&alice());

        let out = state.handle_message(&alice(), ClientMessage::DrawCard);

        assert!(out.is_empty());
        assert!(state.hand(&alice()).is_empty());
        assert_eq!(state.current_turn(), Some(&alice()));
    }

    #[test]
    fn test_reconnect_sends_snapshot() {
        let mut state = started();
        state.sides[0].hand = vec![held("EMP", Effect::Emp)];
        state.player_disconnected(&alice());

        let out = state.handle_message(&alice(), ClientMessage::Reconnect);

        assert_eq!(
            out,
            vec![
                (Recipient::All, ServerMessage::ReconnectSuccess { username: alice() }),
                (
                    Recipient::Player(alice()),
                    ServerMessage::GameStateUpdate {
                        ships: Fleet::from_placement(fleet_at(0)).unwrap(),
                        hand: vec![held("EMP", Effect::Emp)],
                        current_turn: Some(alice()),
                    }
                ),
            ]
        );
        assert!(!state.is_disconnected(&alice()));
    }

    #[test]
    fn test_reconnect_when_connected_is_rejected() {
        let mut state = started();

        assert!(matches!(state.reconnect(&bob()), Err(MatchError::NotDisconnected(_))));
        assert!(state.handle_message(&bob(), ClientMessage::Reconnect).is_empty());
    }

    #[test]
    fn test_forfeit_declares_opponent_winner() {
        let mut state = started();
        state.player_disconnected(&bob());

        let out = state.forfeit(&bob()).unwrap();

        assert_eq!(
            out,
            vec![(
                Recipient::All,
                ServerMessage::GameOver {
                    winner: alice(),
                    message: "bob disconnected. Game over!".into(),
                }
            )]
        );
        assert!(state.is_finished());
        assert!(state.forfeit(&alice()).is_err());
    }

    #[test]
    fn test_handle_message_unknown_sender_is_ignored() {
        let mut state = started();

        let out = state.handle_message(&PlayerId::new("mallory"), ClientMessage::DrawCard);

        assert!(out.is_empty());
    }
}
