//! H-Group convention: chop, focus, and a prompt-and-finesse resolver.
//!
//! Unlike the encoder, clues under this convention don't carry arithmetic meaning on their own;
//! the *target* of the touch does. A clue's "focus" (its chop if that was touched, else the
//! leftmost newly-touched card, else the leftmost touched card) is assumed to be either directly
//! playable or the start of a chain of connecting cards already sitting in other players' hands,
//! clued (a prompt) or not (a finesse). Everything else a clue touches without being the focus is
//! `chop_moved`: "not your next discard, but not my message either".

use std::collections::HashSet;
use std::sync::Mutex;

use log::info;

use crate::basics::action::{ClueAction, DiscardAction, PerformAction, PlayAction, TurnAction};
use crate::basics::card::{CardStatus, Identifiable, Identity};
use crate::basics::clue::{BaseClue, ClueKind};
use crate::basics::game::{Convention, Game};
use crate::basics::identity_set::IdentitySet;
use crate::basics::state::State;
use crate::basics::variant::{all_ids, colourable_suits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BadPlay;

/// Mutable bookkeeping for a single simulated prompt/finesse chain.
struct SimulationState {
	pointer: Identity,
	stacks: Vec<usize>,
	already_played: HashSet<usize>,
	additional_cards_gotten: HashSet<usize>,
	has_been_incremented: bool,
}

impl SimulationState {
	fn new(pointer: Identity, stacks: Vec<usize>) -> Self {
		Self { pointer, stacks, already_played: HashSet::new(), additional_cards_gotten: HashSet::new(), has_been_incremented: false }
	}

	fn is_playable(&self, id: Identity) -> bool {
		self.stacks[id.suit_index] + 1 == id.rank
	}

	fn play(&mut self, order: usize, id: Identity, finesse: bool) -> Result<(), BadPlay> {
		if !self.is_playable(id) {
			return Err(BadPlay);
		}

		self.stacks[id.suit_index] = id.rank;
		self.already_played.insert(order);

		if id == self.pointer {
			self.pointer.rank += 1;
			self.has_been_incremented = true;
		}

		if finesse {
			self.additional_cards_gotten.insert(order);
		}

		Ok(())
	}
}

#[derive(Default)]
struct HGroupState {
	chop_moved: HashSet<usize>,
}

pub struct HGroup {
	state: Mutex<HGroupState>,
}

impl Default for HGroup {
	fn default() -> Self {
		Self::new()
	}
}

impl HGroup {
	pub fn new() -> Self {
		Self { state: Mutex::new(HGroupState::default()) }
	}

	/// The player's oldest card that is neither clue-touched nor chop-moved.
	pub fn chop(&self, game: &Game, player_index: usize) -> Option<usize> {
		let chop_moved = &self.state.lock().unwrap().chop_moved;

		game.state.hands[player_index].iter().rev()
			.find(|&&order| !game.state.deck[order].clued && !chop_moved.contains(&order))
			.copied()
	}

	/// The focus of a clue touching `touched` in `target`'s hand: the chop if it was touched,
	/// else the leftmost newly-touched card, else the leftmost touched card.
	pub fn focus_of_clue(&self, game: &Game, target: usize, touched: &[usize]) -> Option<usize> {
		let chop_before = self.chop(game, target);
		focus_of_clue(game, target, touched, chop_before)
	}

	fn tag_chop_moved(&self, game: &mut Game, order: usize) {
		{
			let mut state = self.state.lock().unwrap();
			state.chop_moved.insert(order);
		}

		game.meta[order].status = CardStatus::ChopMoved;

		let non_trash = IdentitySet::from_iter(all_ids(&game.state.variant).filter(|&id| !game.state.is_basic_trash(id)));
		let thought = &mut game.common.thoughts[order];
		let new_inferred = thought.inferred.intersect(&non_trash);
		if !new_inferred.is_empty() {
			thought.inferred = new_inferred;
		}
	}

	/// Searches one player's hand, right to left, for a slot whose candidates include the
	/// pointer identity. `clued` selects between the prompt pass (already-touched cards) and the
	/// finesse pass (untouched cards). A card whose true identity isn't the pointer but happens
	/// to be a candidate is still "played" onto the simulated stack, since the giver is assumed to
	/// know what they're doing; if that play would be illegal, the whole branch is a bad play.
	fn search_hand(game: &Game, player_index: usize, clued: bool, sim: &mut SimulationState) -> Result<(), BadPlay> {
		for &order in &game.state.hands[player_index] {
			if sim.has_been_incremented {
				return Ok(());
			}

			let card = &game.state.deck[order];
			if card.clued != clued {
				continue;
			}

			if !game.common.thoughts[order].possibilities().contains(sim.pointer) {
				continue;
			}

			let Some(id) = card.id() else { continue };
			sim.play(order, id, !clued)?;
		}

		Ok(())
	}

	/// Simulates the chain of connecting cards between the current stack and a focused identity,
	/// per the prompt-then-finesse, right-to-left resolution order. Returns the set of orders
	/// consumed along the way (to be tagged `CalledToPlay`/`Finessed`), or `None` if no chain of
	/// prompts and finesses resolves the pointer.
	fn resolve_chain(game: &Game, target: usize, observer: usize, start: Identity, focus_rank: usize) -> Option<HashSet<usize>> {
		let mut sim = SimulationState::new(start, game.state.play_stacks.clone());

		while sim.pointer.rank < focus_rank {
			sim.has_been_incremented = false;

			for player_index in 0..game.state.num_players {
				if player_index == target || player_index == observer || sim.has_been_incremented {
					continue;
				}
				Self::search_hand(game, player_index, true, &mut sim).ok()?;
			}

			if !sim.has_been_incremented {
				for player_index in 0..game.state.num_players {
					if player_index == target || player_index == observer || sim.has_been_incremented {
						continue;
					}
					Self::search_hand(game, player_index, false, &mut sim).ok()?;
				}
			}

			if !sim.has_been_incremented {
				return None;
			}
		}

		Some(sim.already_played.union(&sim.additional_cards_gotten).copied().collect())
	}
}

/// Given the touched orders in the target's hand: the chop if it was touched, else the leftmost
/// newly-touched card, else the leftmost touched card. "Leftmost" here means nearest the front of
/// the hand vector (the most recently drawn end), matching how slots are counted from the newest.
fn focus_of_clue(game: &Game, target: usize, touched: &[usize], chop_before: Option<usize>) -> Option<usize> {
	if let Some(chop_order) = chop_before {
		if touched.contains(&chop_order) {
			return Some(chop_order);
		}
	}

	let mut first_touched = None;

	for &order in &game.state.hands[target] {
		if !touched.contains(&order) {
			continue;
		}

		if first_touched.is_none() {
			first_touched = Some(order);
		}

		if game.state.deck[order].newly_clued {
			return Some(order);
		}
	}

	first_touched
}

/// A rank-2 or rank-5 clue on the chop, or any clue whose focus is critical, is conventionally a
/// save rather than a play call.
fn is_save_clue(game: &Game, chop_before: Option<usize>, focus: usize, clue: &BaseClue) -> bool {
	if chop_before != Some(focus) {
		return false;
	}

	match game.state.deck[focus].id() {
		Some(id) => game.state.is_critical(id),
		None => clue.kind == ClueKind::RANK && (clue.value == 2 || clue.value == 5),
	}
}

fn criticals(state: &State) -> IdentitySet {
	IdentitySet::from_iter(all_ids(&state.variant).filter(|&id| state.is_critical(id)))
}

fn playables(state: &State) -> IdentitySet {
	IdentitySet::from_iter(all_ids(&state.variant).filter(|&id| state.is_playable(id)))
}

fn save_candidates(state: &State) -> IdentitySet {
	IdentitySet::from_iter(all_ids(&state.variant).filter(|&id| state.is_critical(id) || id.rank == 2 || id.rank == 5))
}

/// The focused-card narrowing rule for a (non-save) play clue; `None` if the rank is 2 or 5,
/// which this convention reserves for save clues rather than narrowing the focus here.
fn play_clue_candidates(state: &State, clue: &BaseClue) -> Option<IdentitySet> {
	match clue.kind {
		ClueKind::RANK if clue.value == 2 || clue.value == 5 => None,
		ClueKind::RANK => Some(playables(state).union(&criticals(state))),
		ClueKind::COLOUR => {
			let non_5_criticals = criticals(state).filter(|id| id.rank != 5);
			Some(playables(state).union(&non_5_criticals))
		}
	}
}

impl Convention for HGroup {
	fn interpret_clue(&self, prev: &Game, game: &mut Game, action: &ClueAction) {
		let ClueAction { target, list, clue, .. } = action;
		let chop_before = self.chop(prev, *target);

		let Some(focus) = focus_of_clue(game, *target, list, chop_before) else { return };

		for &order in list {
			if order != focus && chop_before == Some(order) {
				self.tag_chop_moved(game, order);
			}
		}

		game.meta[focus].focused = true;

		if is_save_clue(game, chop_before, focus, clue) {
			let allow = save_candidates(&game.state);
			let thought = &mut game.common.thoughts[focus];
			let new_inferred = thought.inferred.intersect(&allow);
			if !new_inferred.is_empty() {
				thought.inferred = new_inferred;
			}
			return;
		}

		if let Some(allow) = play_clue_candidates(&game.state, clue) {
			let thought = &mut game.common.thoughts[focus];
			let new_inferred = thought.inferred.intersect(&allow);
			if !new_inferred.is_empty() {
				thought.inferred = new_inferred;
			}
		}

		let candidates = game.common.thoughts[focus].possibilities();
		if candidates.len() != 1 {
			return;
		}
		let id = candidates.iter().next().unwrap();

		if game.state.is_playable(id) {
			game.meta[focus].status = CardStatus::CalledToPlay;
			return;
		}

		// Our own hand's true identity isn't known to us; trust the narrowed candidates without
		// attempting to simulate a chain we can't verify.
		if *target == game.state.our_player_index {
			game.meta[focus].status = CardStatus::CalledToPlay;
			return;
		}

		let start = Identity { suit_index: id.suit_index, rank: game.state.play_stacks[id.suit_index] + 1 };

		if let Some(consumed) = Self::resolve_chain(game, *target, game.state.our_player_index, start, id.rank) {
			game.meta[focus].status = CardStatus::CalledToPlay;

			for order in consumed {
				if order == focus {
					continue;
				}

				let prompted = game.state.deck[order].clued;
				game.meta[order].status = if prompted { CardStatus::CalledToPlay } else { CardStatus::Finessed };
			}
		}
	}

	fn interpret_discard(&self, _prev: &Game, _game: &mut Game, action: &DiscardAction) {
		self.state.lock().unwrap().chop_moved.remove(&action.order);
	}

	fn interpret_play(&self, _prev: &Game, _game: &mut Game, action: &PlayAction) {
		self.state.lock().unwrap().chop_moved.remove(&action.order);
	}

	fn update_turn(&self, _prev: &Game, _game: &mut Game, _action: &TurnAction) {}

	fn take_action(&self, game: &Game) -> PerformAction {
		let our_index = game.state.our_player_index;
		let frame = game.frame();

		if let Some(&order) = game.state.hands[our_index].iter().find(|&&o| game.common.order_kp(&frame, o)) {
			return PerformAction::Play { table_id: None, target: order };
		}

		if let Some(&order) = game.common.thinks_playables(&frame, our_index).first() {
			return PerformAction::Play { table_id: None, target: order };
		}

		if game.state.clue_tokens > 0 {
			if let Some(clue) = self.find_all_clues(game, our_index).into_iter().next() {
				return clue;
			}
		}

		if let Some(&order) = game.common.thinks_trash(&frame, our_index).first() {
			return PerformAction::Discard { table_id: None, target: order };
		}

		let chop_order = self.chop(game, our_index).unwrap_or_else(|| *game.state.hands[our_index].last().unwrap());
		PerformAction::Discard { table_id: None, target: chop_order }
	}

	fn find_all_clues(&self, game: &Game, player_index: usize) -> Vec<PerformAction> {
		if game.state.current_player_index != player_index || game.state.clue_tokens == 0 {
			return Vec::new();
		}

		let frame = game.frame();
		let mut result = Vec::new();

		for offset in 1..game.state.num_players {
			let target = (player_index + offset) % game.state.num_players;

			if game.common.thinks_loaded(&frame, target) {
				continue;
			}

			let Some(chop_order) = self.chop(game, target) else { continue };
			let Some(id) = game.state.deck[chop_order].id() else { continue };

			if !(game.state.is_critical(id) || game.state.is_playable(id)) {
				continue;
			}

			let rank_clue = BaseClue { kind: ClueKind::RANK, value: id.rank };
			if game.state.clue_touched(&game.state.hands[target], &rank_clue).contains(&chop_order) {
				result.push(PerformAction::Rank { table_id: None, target, value: id.rank });
				continue;
			}

			let colour_clue = (0..colourable_suits(&game.state.variant).len())
				.map(|value| BaseClue { kind: ClueKind::COLOUR, value })
				.find(|clue| game.state.clue_touched(&game.state.hands[target], clue).contains(&chop_order));

			if let Some(BaseClue { value, .. }) = colour_clue {
				result.push(PerformAction::Colour { table_id: None, target, value });
			}
		}

		result
	}

	fn find_all_discards(&self, game: &Game, player_index: usize) -> Vec<PerformAction> {
		let frame = game.frame();
		game.players[player_index].thinks_trash(&frame, player_index).into_iter()
			.map(|order| PerformAction::Discard { table_id: None, target: order })
			.collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::basics::variant::{Variant, VariantOpts};
	use std::sync::Arc;

	fn variant() -> Arc<Variant> {
		Arc::new(Variant::new(0, "No Variant", &["Red", "Yellow", "Green", "Blue", "Purple"], &["r", "y", "g", "b", "p"], VariantOpts::default()))
	}

	#[test]
	fn play_clue_candidates_defers_on_ambiguous_ranks() {
		let state = State::new(vec!["Alice".to_string(), "Bob".to_string()], 0, variant());

		assert!(play_clue_candidates(&state, &BaseClue { kind: ClueKind::RANK, value: 2 }).is_none());
		assert!(play_clue_candidates(&state, &BaseClue { kind: ClueKind::RANK, value: 5 }).is_none());
		assert!(play_clue_candidates(&state, &BaseClue { kind: ClueKind::RANK, value: 3 }).is_some());
	}

	#[test]
	fn save_candidates_includes_every_five() {
		let state = State::new(vec!["Alice".to_string(), "Bob".to_string()], 0, variant());
		let candidates = save_candidates(&state);

		for suit_index in 0..5 {
			assert!(candidates.contains(Identity { suit_index, rank: 5 }));
		}
	}

	fn black_variant() -> Arc<Variant> {
		Arc::new(Variant::new(0, "Black (6 Suits)", &["Red", "Yellow", "Green", "Blue", "Black", "Purple"], &["r", "y", "g", "b", "k", "p"], VariantOpts::default()))
	}

	#[test]
	fn criticals_excludes_dupes_already_basic_trash_and_excludes_non_5_fives() {
		let mut state = State::new(vec!["Alice".to_string(), "Bob".to_string(), "Cathy".to_string()], 0, black_variant());
		state.play_stacks = vec![0, 0, 2, 0, 2, 0];
		state.discard_stacks[2][0] = 2; // 2 copies of (2,1) discarded, but suit 2's stack already covers rank 1: not critical.
		state.discard_stacks[2][3] = 1; // (2,4)
		state.discard_stacks[1][1] = 1; // (1,2)
		state.discard_stacks[3][0] = 2; // (3,1)
		state.discard_stacks[4][4] = 1; // (4,5), excluded below since non_5_criticals drops rank 5.

		// Suit 4 is Black (single copy per rank): every surviving rank is critical with no
		// discards needed, which is why (4,3) and (4,4) show up unprompted.
		let non_5_criticals = criticals(&state).filter(|id| id.rank != 5);

		let expected = [
			Identity { suit_index: 1, rank: 2 },
			Identity { suit_index: 2, rank: 4 },
			Identity { suit_index: 3, rank: 1 },
			Identity { suit_index: 4, rank: 3 },
			Identity { suit_index: 4, rank: 4 },
		];

		assert_eq!(non_5_criticals.len(), expected.len());
		for id in expected {
			assert!(non_5_criticals.contains(id), "expected {:?} to be critical", id);
		}
		assert!(!non_5_criticals.contains(Identity { suit_index: 2, rank: 1 }), "(2,1) is already played out, not critical");
	}
}
