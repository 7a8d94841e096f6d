//! Authoritative table state.
//!
//! `RoundState` is the only mutable record of play. Phases mutate it through
//! the methods below; participants only ever see [`RoundView`] snapshots.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::evaluator::{EvaluationRequest, HandEvaluator};
use crate::message::{RoundView, SeatView, WallView};
use crate::settings::GameSettings;
use crate::tile::{self, dora_kind};
use crate::types::{seat_distance, HandStatus, Meld, MeldKind, PointInfo, Seat, Transfer, Wind};

pub mod claims;
pub mod wall;

pub use wall::{FixedWallSource, RoundKey, WallBuilder, WallSource, WallState};

pub const RIICHI_DEPOSIT: i32 = 1_000;

/// Insert `tile` into a sorted hand, maintaining sort order.
#[inline]
fn sorted_insert(hand: &mut Vec<u8>, tile: u8) {
    let pos = hand.partition_point(|&t| t < tile);
    hand.insert(pos, tile);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatInfo {
    pub name: String,
    pub is_bot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedTile {
    pub tile: u8,
    /// Discarded straight after drawing it.
    pub tsumogiri: bool,
    /// The discard that declared riichi.
    pub riichi: bool,
    /// Taken into another seat's meld.
    pub claimed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    /// Sorted concealed tiles, not including an undiscarded draw.
    pub hand: Vec<u8>,
    pub melds: Vec<Meld>,
    pub discards: Vec<DiscardedTile>,
    pub bei_doras: Vec<u8>,
    pub riichi: bool,
    pub one_shot: bool,
    pub bonus_time_ms: u64,
    pub score: i32,
}

impl PlayerState {
    fn reset_for_round(&mut self, bonus_time_ms: u64) {
        self.hand.clear();
        self.melds.clear();
        self.discards.clear();
        self.bei_doras.clear();
        self.riichi = false;
        self.one_shot = false;
        self.bonus_time_ms = bonus_time_ms;
    }

    pub fn has_open_meld(&self) -> bool {
        self.melds.iter().any(|m| m.is_open())
    }

    pub fn discarded_kinds(&self) -> Vec<u8> {
        let mut kinds: Vec<u8> = self.discards.iter().map(|d| tile::kind(d.tile)).collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub num_seats: usize,
    pub seats: Vec<SeatInfo>,
    pub players: Vec<PlayerState>,
    pub wall: WallState,

    pub current_seat: Seat,
    /// Tile drawn by the acting seat and not yet discarded or merged.
    pub last_draw: Option<(Seat, u8)>,
    pub last_discard: Option<(Seat, u8)>,
    /// Seat whose riichi discard is waiting to survive the claim window.
    pub pending_riichi: Option<Seat>,

    pub dealer: Seat,
    /// Dealer rotations completed so far.
    pub round_index: u32,
    pub extra: u32,
    pub sticks: u32,
    pub hand_index: u64,
    pub first_turn: bool,
    pub dealt: bool,
}

impl RoundState {
    pub fn new(seats: Vec<SeatInfo>, settings: &GameSettings) -> EngineResult<Self> {
        settings.validate()?;
        if seats.len() != settings.num_seats {
            return Err(EngineError::InvalidConfig {
                message: format!("{} seats for a {}-seat table", seats.len(), settings.num_seats),
            });
        }
        let players = (0..seats.len())
            .map(|_| PlayerState {
                score: settings.starting_points,
                bonus_time_ms: settings.initial_bonus_time_ms,
                ..Default::default()
            })
            .collect();
        Ok(Self {
            num_seats: seats.len(),
            seats,
            players,
            wall: WallState::default(),
            current_seat: 0,
            last_draw: None,
            last_discard: None,
            pending_riichi: None,
            dealer: 0,
            round_index: 0,
            extra: 0,
            sticks: 0,
            hand_index: 0,
            first_turn: true,
            dealt: false,
        })
    }

    // -----------------------------------------------------------------------
    // Round lifecycle
    // -----------------------------------------------------------------------

    /// Dealer rotation and repeat-counter bookkeeping between rounds.
    pub fn advance(&mut self, next: bool, extra: bool, keep_sticks: bool) {
        if next {
            self.dealer = (self.dealer + 1) % self.num_seats;
            self.round_index += 1;
        }
        self.extra = if extra { self.extra + 1 } else { 0 };
        if !keep_sticks {
            self.sticks = 0;
        }
    }

    pub fn round_key(&self) -> RoundKey {
        RoundKey {
            hand_index: self.hand_index,
            round_index: self.round_index,
            extra: self.extra,
        }
    }

    /// Resets the per-round state and deals from a fresh wall.
    pub fn start_round(&mut self, tiles: Vec<u8>, settings: &GameSettings) -> EngineResult<()> {
        let mut wall = WallState::from_tiles(tiles, self.num_seats)?;
        let hands = wall.deal(self.num_seats, self.dealer)?;
        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.reset_for_round(settings.initial_bonus_time_ms);
            player.hand = hand;
        }
        self.wall = wall;
        self.current_seat = self.dealer;
        self.last_draw = None;
        self.last_discard = None;
        self.pending_riichi = None;
        self.first_turn = true;
        self.hand_index += 1;
        self.dealt = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn player(&self, seat: Seat) -> EngineResult<&PlayerState> {
        self.players
            .get(seat)
            .ok_or_else(|| EngineError::invariant(format!("no seat {}", seat)))
    }

    fn player_mut(&mut self, seat: Seat) -> EngineResult<&mut PlayerState> {
        self.players
            .get_mut(seat)
            .ok_or_else(|| EngineError::invariant(format!("no seat {}", seat)))
    }

    pub fn hand(&self, seat: Seat) -> &[u8] {
        self.players.get(seat).map(|p| p.hand.as_slice()).unwrap_or(&[])
    }

    pub fn open_melds(&self, seat: Seat) -> &[Meld] {
        self.players.get(seat).map(|p| p.melds.as_slice()).unwrap_or(&[])
    }

    pub fn discards(&self, seat: Seat) -> &[DiscardedTile] {
        self.players.get(seat).map(|p| p.discards.as_slice()).unwrap_or(&[])
    }

    pub fn bei_doras(&self, seat: Seat) -> &[u8] {
        self.players.get(seat).map(|p| p.bei_doras.as_slice()).unwrap_or(&[])
    }

    pub fn bonus_time(&self, seat: Seat) -> u64 {
        self.players.get(seat).map(|p| p.bonus_time_ms).unwrap_or(0)
    }

    /// Largest remaining budget among `seats` (0 for an empty set).
    pub fn max_bonus_time(&self, seats: &[Seat]) -> u64 {
        seats.iter().map(|&s| self.bonus_time(s)).max().unwrap_or(0)
    }

    pub fn scores(&self) -> Vec<i32> {
        self.players.iter().map(|p| p.score).collect()
    }

    pub fn last_draw_of(&self, seat: Seat) -> Option<u8> {
        self.last_draw.filter(|&(s, _)| s == seat).map(|(_, t)| t)
    }

    /// Hand plus the seat's undiscarded draw.
    pub fn concealed_tiles(&self, seat: Seat) -> Vec<u8> {
        let mut tiles = self.hand(seat).to_vec();
        if let Some(t) = self.last_draw_of(seat) {
            sorted_insert(&mut tiles, t);
        }
        tiles
    }

    pub fn dora_indicators(&self) -> &[u8] {
        self.wall.dora_indicators()
    }

    pub fn ura_dora_indicators(&self) -> &[u8] {
        self.wall.ura_dora_indicators()
    }

    pub fn total_tiles(&self) -> usize {
        tile::tile_count(self.num_seats)
    }

    pub fn round_wind(&self) -> Wind {
        Wind::from(self.round_index as usize / self.num_seats)
    }

    pub fn seat_wind(&self, seat: Seat) -> Wind {
        Wind::from(seat_distance(self.dealer, seat, self.num_seats))
    }

    pub fn next_seat(&self, seat: Seat) -> Seat {
        (seat + 1) % self.num_seats
    }

    pub fn kong_count(&self) -> usize {
        self.players
            .iter()
            .flat_map(|p| p.melds.iter())
            .filter(|m| m.is_kong())
            .count()
    }

    /// Own view of a seat: every concealed tile is visible.
    pub fn hand_data(&self, seat: Seat) -> SeatView {
        let mut view = self.public_hand(seat);
        view.hand = Some(self.hand(seat).to_vec());
        view.last_draw = self.last_draw_of(seat);
        view
    }

    /// What other seats see: tile count and public information only.
    pub fn public_hand(&self, seat: Seat) -> SeatView {
        let info = self.seats.get(seat);
        let player = self.players.get(seat);
        SeatView {
            seat,
            name: info.map(|i| i.name.clone()).unwrap_or_default(),
            is_bot: info.map(|i| i.is_bot).unwrap_or(false),
            hand: None,
            last_draw: None,
            hand_count: self.concealed_tiles(seat).len(),
            melds: self.open_melds(seat).to_vec(),
            discards: self.discards(seat).to_vec(),
            bei_doras: self.bei_doras(seat).to_vec(),
            riichi: player.map(|p| p.riichi).unwrap_or(false),
            score: player.map(|p| p.score).unwrap_or(0),
            bonus_time_ms: self.bonus_time(seat),
        }
    }

    pub fn view_for(&self, viewer: Seat) -> RoundView {
        let seats = (0..self.num_seats)
            .map(|s| if s == viewer { self.hand_data(s) } else { self.public_hand(s) })
            .collect();
        RoundView {
            viewer,
            dealer: self.dealer,
            round_index: self.round_index,
            extra: self.extra,
            sticks: self.sticks,
            current_seat: self.current_seat,
            seats,
            wall: WallView {
                live_remaining: self.wall.live_remaining(),
                dora_indicators: self.dora_indicators().to_vec(),
            },
        }
    }

    /// Runs the hand evaluator for `seat` winning on `tile`.
    pub fn evaluate_win(
        &self,
        evaluator: &dyn HandEvaluator,
        seat: Seat,
        tile: u8,
        status: HandStatus,
    ) -> PointInfo {
        let Some(player) = self.players.get(seat) else {
            return PointInfo::default();
        };
        let three_seat = self.num_seats == 3;
        let dora_kinds: Vec<u8> = self
            .dora_indicators()
            .iter()
            .map(|&t| dora_kind(tile::kind(t), three_seat))
            .collect();
        let ura_dora_kinds: Vec<u8> = self
            .ura_dora_indicators()
            .iter()
            .map(|&t| dora_kind(tile::kind(t), three_seat))
            .collect();
        let discarded_kinds = player.discarded_kinds();
        let status = HandStatus {
            riichi: player.riichi,
            one_shot: player.one_shot,
            first_turn: self.first_turn && player.melds.is_empty(),
            ..status
        };
        evaluator.evaluate(&EvaluationRequest {
            seat,
            hand: &player.hand,
            melds: &player.melds,
            tile,
            status,
            dora_kinds: &dora_kinds,
            ura_dora_kinds: &ura_dora_kinds,
            bei_dora_count: player.bei_doras.len(),
            discarded_kinds: &discarded_kinds,
            seat_wind: self.seat_wind(seat),
            round_wind: self.round_wind(),
        })
    }

    /// Whether the seat's 13-tile hand is waiting on something.
    pub fn is_ready(&self, evaluator: &dyn HandEvaluator, seat: Seat) -> bool {
        evaluator.is_ready(&self.concealed_tiles(seat), self.open_melds(seat))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn add_tile(&mut self, seat: Seat, tile: u8) -> EngineResult<()> {
        sorted_insert(&mut self.player_mut(seat)?.hand, tile);
        Ok(())
    }

    pub fn remove_tile(&mut self, seat: Seat, tile: u8) -> EngineResult<()> {
        let hand = &mut self.player_mut(seat)?.hand;
        let idx = hand
            .iter()
            .position(|&t| t == tile)
            .ok_or_else(|| EngineError::invariant(format!("seat {} does not hold tile {}", seat, tile)))?;
        hand.remove(idx);
        Ok(())
    }

    pub fn add_meld(&mut self, seat: Seat, meld: Meld) -> EngineResult<()> {
        self.player_mut(seat)?.melds.push(meld);
        Ok(())
    }

    /// Upgrades the seat's pon of `tile`'s kind into an added kong.
    pub fn add_kong(&mut self, seat: Seat, tile: u8) -> EngineResult<Meld> {
        let kind = tile::kind(tile);
        let player = self.player_mut(seat)?;
        let meld = player
            .melds
            .iter_mut()
            .find(|m| m.kind == MeldKind::Pon && m.first_kind() == kind)
            .ok_or_else(|| EngineError::invariant(format!("seat {} has no pon to extend", seat)))?;
        let mut tiles = meld.tiles.clone();
        tiles.push(tile);
        let from_seat = meld.from_seat;
        *meld = Meld::new(MeldKind::AddedKong, tiles, Some(tile), from_seat);
        Ok(meld.clone())
    }

    pub fn sort_hands(&mut self) {
        for player in self.players.iter_mut() {
            player.hand.sort_unstable();
        }
    }

    /// Folds the seat's drawn tile into its hand.
    pub fn merge_last_draw(&mut self, seat: Seat) -> EngineResult<()> {
        if let Some(t) = self.last_draw_of(seat) {
            self.last_draw = None;
            self.add_tile(seat, t)?;
        }
        Ok(())
    }

    /// Any call interrupts the go-around.
    pub fn break_one_shots_and_first_turn(&mut self) {
        for player in self.players.iter_mut() {
            player.one_shot = false;
        }
        self.first_turn = false;
    }

    pub fn turn_dora(&mut self) -> Option<u8> {
        self.wall.turn_dora()
    }

    /// Draws for `seat` from the live wall, or from the replacement pool.
    pub fn draw_tile(&mut self, seat: Seat, replacement: bool) -> EngineResult<u8> {
        if self.last_draw.is_some() {
            return Err(EngineError::invariant("draw while another draw is held"));
        }
        let tile = if replacement {
            self.wall.draw_replacement()
        } else {
            self.wall.draw()
        }
        .ok_or_else(|| EngineError::invariant("draw from an empty wall"))?;

        if seat == self.dealer && !self.discards(seat).is_empty() {
            self.first_turn = false;
        }
        self.current_seat = seat;
        self.last_draw = Some((seat, tile));
        Ok(tile)
    }

    pub fn discard(&mut self, seat: Seat, tile: u8, riichi: bool) -> EngineResult<DiscardedTile> {
        let tsumogiri = self.last_draw_of(seat) == Some(tile);
        if tsumogiri {
            self.last_draw = None;
        } else {
            self.remove_tile(seat, tile)?;
            self.merge_last_draw(seat)?;
        }
        let discarded = DiscardedTile {
            tile,
            tsumogiri,
            riichi,
            claimed: false,
        };
        let player = self.player_mut(seat)?;
        player.one_shot = false;
        player.discards.push(discarded);
        self.last_discard = Some((seat, tile));
        if riichi {
            self.pending_riichi = Some(seat);
        }
        Ok(discarded)
    }

    /// Marks the last discard as taken and returns `(discarder, tile)`.
    pub fn claim_last_discard(&mut self) -> EngineResult<(Seat, u8)> {
        let (from, tile) = self
            .last_discard
            .take()
            .ok_or_else(|| EngineError::invariant("claim without a discard"))?;
        let last = self
            .player_mut(from)?
            .discards
            .last_mut()
            .ok_or_else(|| EngineError::invariant("discarder has no discards"))?;
        last.claimed = true;
        Ok((from, tile))
    }

    pub fn add_bei_dora(&mut self, seat: Seat, tile: u8) -> EngineResult<()> {
        self.merge_last_draw(seat)?;
        self.remove_tile(seat, tile)?;
        self.player_mut(seat)?.bei_doras.push(tile);
        Ok(())
    }

    /// Settles a riichi whose declaring discard was not won on.
    pub fn accept_riichi(&mut self) -> Option<Seat> {
        let seat = self.pending_riichi.take()?;
        let player = self.players.get_mut(seat)?;
        player.score -= RIICHI_DEPOSIT;
        player.riichi = true;
        player.one_shot = true;
        self.sticks += 1;
        Some(seat)
    }

    pub fn spend_bonus_time(&mut self, seat: Seat, spent_ms: u64) {
        if let Some(player) = self.players.get_mut(seat) {
            player.bonus_time_ms = player.bonus_time_ms.saturating_sub(spent_ms);
        }
    }

    /// Applies score movements. A transfer without a payer drains the stick
    /// pool.
    pub fn apply_transfers(&mut self, transfers: &[Transfer]) -> EngineResult<()> {
        for transfer in transfers {
            match transfer.from {
                Some(from) => self.player_mut(from)?.score -= transfer.amount,
                None => self.sticks = 0,
            }
            self.player_mut(transfer.to)?.score += transfer.amount;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    pub fn verify(&self) -> EngineResult<()> {
        if !self.dealt {
            return Ok(());
        }
        if self.players.len() != self.num_seats || self.seats.len() != self.num_seats {
            return Err(EngineError::invariant("seat list does not match the table size"));
        }

        let in_play: usize = self
            .players
            .iter()
            .map(|p| {
                p.hand.len()
                    + p.melds.iter().map(|m| m.tiles.len()).sum::<usize>()
                    + p.discards.iter().filter(|d| !d.claimed).count()
                    + p.bei_doras.len()
            })
            .sum();
        let drawn = usize::from(self.last_draw.is_some());
        let counted = in_play + drawn + self.wall.tile_total();
        if counted != self.total_tiles() {
            return Err(EngineError::invariant(format!(
                "tile count {} does not match the table's {}",
                counted,
                self.total_tiles()
            )));
        }

        for (seat, p) in self.players.iter().enumerate() {
            let size = p.hand.len() + usize::from(self.last_draw_of(seat).is_some()) + 3 * p.melds.len();
            let acting = seat == self.current_seat;
            if !(size == 13 || (size == 14 && acting)) {
                return Err(EngineError::invariant(format!(
                    "seat {} holds {} tiles (acting: {})",
                    seat, size, acting
                )));
            }
            if p.hand.windows(2).any(|w| w[0] > w[1]) {
                return Err(EngineError::invariant(format!("seat {} hand is unsorted", seat)));
            }
        }
        Ok(())
    }
}
