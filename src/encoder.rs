//! Hat-guessing ("encoder") convention.
//!
//! Every player not currently clued computes a residue (a small number derived from their
//! leftmost not-yet-hat-clued card) and the clue giver gives whichever clue makes the sum of
//! everyone's residues, modulo a per-player-count base, equal to the message they want to send.
//! A hat clue never needs to touch the card that carries its meaning directly: its existence and
//! target alone carry `log2(num_residues)` bits, and the receiver decodes their own card's
//! identity by subtracting off what everyone else contributed.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use log::warn;

use crate::basics::action::{ClueAction, DiscardAction, PlayAction, TurnAction};
use crate::basics::card::{Identifiable, Identity};
use crate::basics::clue::{BaseClue, ClueKind};
use crate::basics::game::{Convention, Game};
use crate::basics::action::PerformAction;
use crate::basics::identity_set::IdentitySet;
use crate::basics::variant::{
	available_color_clues, available_rank_clues, colourable_suits, is_brownish_pinkish, is_whiteish_rainbowy,
	touch_possibilities, Variant,
};
use crate::error::EngineError;

/// `(suit_index, offset)`, mirroring the three markers used by the original residue tables:
/// `Trash` (unconditionally discardable), `Playable` (whatever is currently playable), and
/// `StackPlus(suit, n)` meaning "n cards above the current play stack of `suit`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResidueSlot {
	Trash,
	Playable,
	StackPlus(usize, usize),
}

type ModTable = Vec<Vec<ResidueSlot>>;

fn mod_table(num_suits: usize, modulus: usize) -> Option<ModTable> {
	use ResidueSlot::{Playable, StackPlus as S, Trash};

	let table: Vec<Vec<ResidueSlot>> = match (num_suits, modulus) {
		(6, 12) => vec![
			vec![Trash],
			vec![Playable],
			vec![S(0, 2), S(3, 2)],
			vec![S(1, 2)],
			vec![S(2, 2)],
			vec![S(4, 2)],
			vec![S(5, 2)],
			vec![S(0, 3), S(3, 3)],
			vec![S(1, 3), S(4, 3)],
			vec![S(2, 3), S(5, 3)],
			vec![S(0, 4), S(1, 5), S(2, 4), S(3, 5), S(4, 4), S(5, 5)],
			vec![S(0, 5), S(1, 4), S(2, 5), S(3, 4), S(4, 5), S(5, 4)],
		],
		(6, 16) => vec![
			vec![Trash],
			vec![Playable],
			vec![S(0, 2)],
			vec![S(1, 2)],
			vec![S(2, 2)],
			vec![S(3, 2)],
			vec![S(4, 2)],
			vec![S(5, 2)],
			vec![S(0, 3), S(3, 3)],
			vec![S(1, 3), S(4, 3)],
			vec![S(2, 3), S(5, 3)],
			vec![S(0, 4), S(3, 5), S(5, 4)],
			vec![S(1, 4), S(4, 5)],
			vec![S(2, 4), S(5, 5)],
			vec![S(3, 4), S(0, 5)],
			vec![S(4, 4), S(1, 5), S(2, 5)],
		],
		(5, 12) => vec![
			vec![Trash],
			vec![Playable],
			vec![S(0, 2)],
			vec![S(1, 2)],
			vec![S(2, 2)],
			vec![S(3, 2)],
			vec![S(4, 2)],
			vec![S(0, 3), S(2, 3)],
			vec![S(1, 3), S(3, 3)],
			vec![S(4, 3)],
			vec![S(0, 4), S(1, 5), S(2, 4), S(3, 5), S(4, 4)],
			vec![S(0, 5), S(1, 4), S(2, 5), S(3, 4), S(4, 5)],
		],
		(5, 16) => vec![
			vec![Trash],
			vec![Playable],
			vec![S(0, 2)],
			vec![S(1, 2)],
			vec![S(2, 2)],
			vec![S(3, 2)],
			vec![S(4, 2)],
			vec![S(0, 3)],
			vec![S(1, 3)],
			vec![S(2, 3)],
			vec![S(3, 3)],
			vec![S(4, 3)],
			vec![S(0, 4), S(2, 5), S(4, 4)],
			vec![S(1, 4), S(3, 5)],
			vec![S(2, 4), S(4, 5)],
			vec![S(3, 4), S(0, 5), S(1, 5)],
		],
		(5, 20) => vec![
			vec![Trash],
			vec![Playable],
			vec![S(0, 2)],
			vec![S(1, 2)],
			vec![S(2, 2)],
			vec![S(3, 2)],
			vec![S(4, 2)],
			vec![S(0, 3)],
			vec![S(1, 3)],
			vec![S(2, 3)],
			vec![S(3, 3)],
			vec![S(4, 3)],
			vec![S(0, 4)],
			vec![S(1, 4)],
			vec![S(2, 4)],
			vec![S(3, 4)],
			vec![S(4, 4)],
			vec![S(0, 5), S(2, 5)],
			vec![S(1, 5), S(3, 5)],
			vec![S(4, 5)],
		],
		(4, 12) => vec![
			vec![Trash],
			vec![Playable],
			vec![S(0, 2)],
			vec![S(1, 2)],
			vec![S(2, 2)],
			vec![S(3, 2)],
			vec![S(0, 3), S(2, 3)],
			vec![S(1, 3), S(3, 3)],
			vec![S(0, 4), S(2, 5)],
			vec![S(1, 4), S(3, 5)],
			vec![S(2, 4), S(0, 5)],
			vec![S(3, 4), S(1, 5)],
		],
		(4, 16) => vec![
			vec![Trash],
			vec![Playable],
			vec![S(0, 2)],
			vec![S(1, 2)],
			vec![S(2, 2)],
			vec![S(3, 2)],
			vec![S(0, 3)],
			vec![S(1, 3)],
			vec![S(2, 3)],
			vec![S(3, 3)],
			vec![S(0, 4)],
			vec![S(1, 4)],
			vec![S(2, 4)],
			vec![S(3, 4)],
			vec![S(0, 5), S(2, 5)],
			vec![S(1, 5), S(3, 5)],
		],
		_ => return None,
	};

	Some(table)
}

fn modulus_for(num_players: usize) -> Option<usize> {
	match num_players {
		4 => Some(12),
		5 => Some(16),
		6 => Some(20),
		_ => None,
	}
}

/// Tracks a set of candidate identities for a hat-clued card that may shrink as other players
/// reveal whether they held "unexpected trash" that would have changed the giver's intended sum.
#[derive(Debug, Clone)]
struct SuperPosition {
	default_residue: usize,
	/// increment -> candidate identities if that many triggering cards turned out to be trash
	increment: HashMap<usize, HashSet<Identity>>,
	triggering_orders: HashSet<usize>,
	actual_num_trash: usize,
}

impl SuperPosition {
	fn residue(&self, mod_base: usize) -> usize {
		(self.default_residue + self.actual_num_trash) % mod_base
	}

	fn candidates(&self) -> HashSet<Identity> {
		self.increment.get(&self.actual_num_trash).cloned().unwrap_or_default()
	}
}

#[derive(Default)]
struct EncoderState {
	hat_clued_orders: HashSet<usize>,
	trashy_orders: HashSet<usize>,
	superpositions: HashMap<usize, SuperPosition>,
	identities_called_to_play: HashSet<Identity>,
}

pub struct Encoder {
	state: Mutex<EncoderState>,
}

impl Default for Encoder {
	fn default() -> Self {
		Self::new()
	}
}

impl Encoder {
	pub fn new() -> Self {
		Self { state: Mutex::new(EncoderState::default()) }
	}

	fn mod_base(variant: &Variant, num_players: usize) -> Option<usize> {
		let modulus = modulus_for(num_players)?;
		mod_table(variant.suits.len(), modulus).map(|_| modulus)
	}

	fn num_residues_per_player(variant: &Variant, num_players: usize) -> Option<usize> {
		Self::mod_base(variant, num_players).map(|base| base / (num_players - 1))
	}

	/// Every identity still possibly remaining, mapped to the residue it represents this turn.
	/// `None` when this table/player-count shape has no residue table (§8's "unimplemented
	/// variant combinations" boundary).
	fn identity_to_residue(game: &Game) -> Option<HashMap<Identity, usize>> {
		let modulus = modulus_for(game.state.num_players)?;
		let table = mod_table(game.state.variant.suits.len(), modulus)?;
		let mut result = HashMap::new();

		for (residue, slots) in table.iter().enumerate() {
			for slot in slots {
				match slot {
					ResidueSlot::Playable => {
						for suit_index in 0..game.state.variant.suits.len() {
							let rank = game.state.play_stacks[suit_index] + 1;
							if rank <= 5 {
								result.insert(Identity { suit_index, rank }, residue);
							}
						}
					}
					ResidueSlot::StackPlus(suit_index, n) => {
						let rank = game.state.play_stacks[*suit_index] + n;
						if rank >= 1 && rank <= 5 {
							result.insert(Identity { suit_index: *suit_index, rank }, residue);
						}
					}
					ResidueSlot::Trash => {}
				}
			}
		}

		// trash always overrides whatever the stack-relative slots computed
		for suit_index in 0..game.state.variant.suits.len() {
			for rank in 1..=game.state.play_stacks[suit_index] {
				result.insert(Identity { suit_index, rank }, 0);
			}
			for rank in (game.state.max_ranks[suit_index] + 1)..=5 {
				result.insert(Identity { suit_index, rank }, 0);
			}
		}

		Some(result)
	}

	fn residue_to_identities(game: &Game) -> Option<HashMap<usize, HashSet<Identity>>> {
		let mut result: HashMap<usize, HashSet<Identity>> = HashMap::new();
		for (id, residue) in Self::identity_to_residue(game)? {
			result.entry(residue).or_default().insert(id);
		}
		Some(result)
	}

	/// The oldest card in the hand that has not yet been assigned a hat-clue bit.
	fn leftmost_non_hat_clued(&self, game: &Game, player_index: usize) -> Option<usize> {
		let state = self.state.lock().unwrap();
		game.state.hands[player_index].iter().rev().find(|&&order| !state.hat_clued_orders.contains(&order)).copied()
	}

	fn rightmost_unnumbered(game: &Game, player_index: usize) -> Option<usize> {
		game.state.hands[player_index].iter().find(|&&order| !game.state.deck[order].clues.iter().any(|c| c.kind == ClueKind::RANK)).copied()
	}

	fn rightmost_uncolored(game: &Game, player_index: usize) -> Option<usize> {
		game.state.hands[player_index].iter().find(|&&order| !game.state.deck[order].clues.iter().any(|c| c.kind == ClueKind::COLOUR)).copied()
	}

	/// Shape-keyed lookup tables for the small number of variants whose clue scheme isn't
	/// derivable from the generic rightmost-unnumbered/rightmost-uncolored rule (Valentine Mix,
	/// 3-colour whiteish-rainbowy variants, 1-colour variants, the `-Ones` family, Odds and Evens).
	fn special_hat_clues(variant: &Variant) -> Option<HashMap<usize, Vec<BaseClue>>> {
		use ClueKind::{COLOUR, RANK};
		let num_colors = available_color_clues(variant);

		if num_colors == 3 && is_whiteish_rainbowy(variant) {
			return Some(HashMap::from([
				(0, vec![BaseClue { kind: RANK, value: 5 }, BaseClue { kind: RANK, value: 1 }]),
				(1, vec![BaseClue { kind: COLOUR, value: 0 }, BaseClue { kind: RANK, value: 2 }]),
				(2, vec![BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: RANK, value: 3 }]),
				(3, vec![BaseClue { kind: COLOUR, value: 2 }, BaseClue { kind: RANK, value: 4 }]),
			]));
		}

		if num_colors == 1 {
			return Some(HashMap::from([
				(0, vec![BaseClue { kind: COLOUR, value: 0 }]),
				(1, vec![BaseClue { kind: RANK, value: 1 }, BaseClue { kind: RANK, value: 5 }]),
				(2, vec![BaseClue { kind: RANK, value: 2 }, BaseClue { kind: RANK, value: 3 }]),
				(3, vec![BaseClue { kind: RANK, value: 4 }]),
			]));
		}

		if variant.name.contains("Light-Pink-Ones") {
			return Some(match num_colors {
				6 => HashMap::from([
					(0, vec![BaseClue { kind: RANK, value: 5 }, BaseClue { kind: COLOUR, value: 0 }]),
					(1, vec![BaseClue { kind: RANK, value: 2 }, BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: COLOUR, value: 2 }]),
					(2, vec![BaseClue { kind: RANK, value: 3 }, BaseClue { kind: COLOUR, value: 3 }, BaseClue { kind: COLOUR, value: 4 }]),
					(3, vec![BaseClue { kind: RANK, value: 4 }, BaseClue { kind: COLOUR, value: 5 }]),
				]),
				5 => HashMap::from([
					(0, vec![BaseClue { kind: RANK, value: 5 }, BaseClue { kind: COLOUR, value: 0 }]),
					(1, vec![BaseClue { kind: RANK, value: 2 }, BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: COLOUR, value: 2 }]),
					(2, vec![BaseClue { kind: RANK, value: 3 }, BaseClue { kind: COLOUR, value: 3 }]),
					(3, vec![BaseClue { kind: RANK, value: 4 }, BaseClue { kind: COLOUR, value: 4 }]),
				]),
				4 => HashMap::from([
					(0, vec![BaseClue { kind: RANK, value: 5 }, BaseClue { kind: COLOUR, value: 0 }]),
					(1, vec![BaseClue { kind: RANK, value: 2 }, BaseClue { kind: COLOUR, value: 1 }]),
					(2, vec![BaseClue { kind: RANK, value: 3 }, BaseClue { kind: COLOUR, value: 2 }]),
					(3, vec![BaseClue { kind: RANK, value: 4 }, BaseClue { kind: COLOUR, value: 3 }]),
				]),
				_ => return None,
			});
		}

		if variant.name.contains("Muddy-Rainbow-Ones") {
			return Some(match num_colors {
				6 => HashMap::from([
					(0, vec![BaseClue { kind: COLOUR, value: 0 }, BaseClue { kind: RANK, value: 5 }]),
					(1, vec![BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: COLOUR, value: 2 }, BaseClue { kind: RANK, value: 2 }]),
					(2, vec![BaseClue { kind: COLOUR, value: 3 }, BaseClue { kind: COLOUR, value: 4 }, BaseClue { kind: RANK, value: 3 }]),
					(3, vec![BaseClue { kind: COLOUR, value: 5 }, BaseClue { kind: RANK, value: 4 }]),
				]),
				5 => HashMap::from([
					(0, vec![BaseClue { kind: COLOUR, value: 0 }, BaseClue { kind: RANK, value: 5 }]),
					(1, vec![BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: COLOUR, value: 2 }, BaseClue { kind: RANK, value: 2 }]),
					(2, vec![BaseClue { kind: COLOUR, value: 3 }, BaseClue { kind: RANK, value: 3 }]),
					(3, vec![BaseClue { kind: COLOUR, value: 4 }, BaseClue { kind: RANK, value: 4 }]),
				]),
				4 => HashMap::from([
					(0, vec![BaseClue { kind: COLOUR, value: 0 }, BaseClue { kind: RANK, value: 5 }]),
					(1, vec![BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: RANK, value: 2 }]),
					(2, vec![BaseClue { kind: COLOUR, value: 2 }, BaseClue { kind: RANK, value: 3 }]),
					(3, vec![BaseClue { kind: COLOUR, value: 3 }, BaseClue { kind: RANK, value: 4 }]),
				]),
				_ => return None,
			});
		}

		if variant.name.contains("Odds and Evens") {
			return Some(match num_colors {
				6 => HashMap::from([
					(0, vec![BaseClue { kind: RANK, value: 1 }, BaseClue { kind: COLOUR, value: 0 }]),
					(1, vec![BaseClue { kind: RANK, value: 2 }]),
					(2, vec![BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: COLOUR, value: 2 }]),
					(3, vec![BaseClue { kind: COLOUR, value: 3 }, BaseClue { kind: COLOUR, value: 4 }, BaseClue { kind: COLOUR, value: 5 }]),
				]),
				5 => HashMap::from([
					(0, vec![BaseClue { kind: RANK, value: 1 }, BaseClue { kind: COLOUR, value: 0 }]),
					(1, vec![BaseClue { kind: RANK, value: 2 }]),
					(2, vec![BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: COLOUR, value: 2 }]),
					(3, vec![BaseClue { kind: COLOUR, value: 3 }, BaseClue { kind: COLOUR, value: 4 }]),
				]),
				4 => HashMap::from([
					(0, vec![BaseClue { kind: RANK, value: 1 }]),
					(1, vec![BaseClue { kind: RANK, value: 2 }]),
					(2, vec![BaseClue { kind: COLOUR, value: 0 }, BaseClue { kind: COLOUR, value: 1 }]),
					(3, vec![BaseClue { kind: COLOUR, value: 2 }, BaseClue { kind: COLOUR, value: 3 }]),
				]),
				_ => return None,
			});
		}

		if variant.name.starts_with("Valentine Mix") {
			return Some(HashMap::from([
				(0, vec![BaseClue { kind: RANK, value: 5 }, BaseClue { kind: RANK, value: 1 }]),
				(1, vec![BaseClue { kind: COLOUR, value: 0 }, BaseClue { kind: RANK, value: 2 }]),
				(2, vec![BaseClue { kind: COLOUR, value: 1 }, BaseClue { kind: RANK, value: 3 }]),
				(3, vec![BaseClue { kind: RANK, value: 4 }]),
			]));
		}

		None
	}

	/// Decodes which raw residue (0-3, before adding the per-target offset) a clue given to
	/// `target_index` by `clue_giver` represents.
	fn hat_residue(&self, game: &Game, clue_giver: usize, target_index: usize, clue: &BaseClue, list: &[usize]) -> usize {
		let variant = &game.state.variant;
		let num_residues = Self::num_residues_per_player(variant, game.state.num_players).unwrap_or(4);
		let rightmost_unnumbered = Self::rightmost_unnumbered(game, target_index);
		let rightmost_uncolored = Self::rightmost_uncolored(game, target_index);

		let raw_residue = if let Some(special) = Self::special_hat_clues(variant) {
			special.iter().find_map(|(residue, clues)| clues.contains(clue).then_some(*residue))
		} else {
			None
		};

		let raw_residue = raw_residue.unwrap_or_else(|| {
			if clue.kind == ClueKind::RANK {
				if is_brownish_pinkish(variant) {
					if [1, 3, 5].contains(&clue.value) { 0 } else { 1 }
				} else {
					match rightmost_unnumbered {
						Some(order) => if list.contains(&order) { 0 } else { 1 },
						None => 0,
					}
				}
			} else if is_whiteish_rainbowy(variant) {
				let num_colors = available_color_clues(variant);
				if clue.value < num_colors / 2 { 2 } else { 3 }
			} else {
				match rightmost_uncolored {
					Some(order) => if list.contains(&order) { 2 } else { 3 },
					None => 2,
				}
			}
		});

		let offset = (target_index + game.state.num_players - clue_giver - 1) % game.state.num_players;
		raw_residue + offset * num_residues
	}

	/// Updates our own hat-clued superposition and everyone else's inferred candidates in
	/// response to a clue given by someone else.
	fn process_hat_clue(&self, game: &mut Game, action: &ClueAction) {
		let ClueAction { giver, target, list, clue } = action;
		let our_index = game.state.our_player_index;

		if *giver == our_index {
			return;
		}

		let Some(mod_base) = Self::mod_base(&game.state.variant, game.state.num_players) else {
			warn!("{}", EngineError::UnimplementedVariant(format!(
				"no hat-guessing residue table for {} players / {} suits",
				game.state.num_players, game.state.variant.suits.len(),
			)));
			return;
		};
		let identity_to_residue = Self::identity_to_residue(game).expect("mod_base just confirmed a table exists");
		let residue_to_identities = Self::residue_to_identities(game).expect("mod_base just confirmed a table exists");
		let hat_residue = self.hat_residue(game, *giver, *target, clue, list);

		let mut triggering_orders = HashSet::new();
		let mut sum_of_others = 0usize;

		for player_index in 0..game.state.num_players {
			if player_index == our_index || player_index == *giver {
				continue;
			}

			let Some(order) = self.leftmost_non_hat_clued(game, player_index) else { continue };
			let Some(identity) = game.state.deck[order].id() else { continue };

			let residue = if game.state.is_playable(identity) {
				triggering_orders.insert(order);
				let mut state = self.state.lock().unwrap();
				if state.identities_called_to_play.contains(&identity) && game.state.score() * 10 < game.state.max_score() * 6 {
					0
				} else {
					state.identities_called_to_play.insert(identity);
					*identity_to_residue.get(&identity).unwrap_or(&0)
				}
			} else {
				*identity_to_residue.get(&identity).unwrap_or(&0)
			};

			sum_of_others += residue;

			let mut implied: IdentitySet = residue_to_identities.get(&residue).map(|set| IdentitySet::from_iter(set.iter().copied())).unwrap_or(IdentitySet::EMPTY);
			if residue == 0 {
				let state = self.state.lock().unwrap();
				implied = implied.union(&IdentitySet::from_iter(state.identities_called_to_play.iter().copied()));
			}

			let thought = &mut game.common.thoughts[order];
			let new_inferred = thought.inferred.intersect(&implied);
			if !new_inferred.is_empty() {
				thought.inferred = new_inferred;
			}

			let mut state = self.state.lock().unwrap();
			state.hat_clued_orders.insert(order);
		}

		if let Some(my_order) = self.leftmost_non_hat_clued(game, our_index) {
			let my_residue = (hat_residue + mod_base - (sum_of_others % mod_base)) % mod_base;
			let mut implied = residue_to_identities.get(&my_residue).cloned().unwrap_or_default();
			{
				let mut state = self.state.lock().unwrap();
				if my_residue == 0 {
					implied.extend(state.identities_called_to_play.iter().copied());
					state.trashy_orders.insert(my_order);
				} else {
					state.trashy_orders.remove(&my_order);
				}
			}

			let increment: HashMap<usize, HashSet<Identity>> = (0..4)
				.map(|i| {
					let residue = (my_residue + i) % mod_base;
					let mut ids = residue_to_identities.get(&residue).cloned().unwrap_or_default();
					if residue == 0 {
						let state = self.state.lock().unwrap();
						ids.extend(state.identities_called_to_play.iter().copied());
					}
					(i, ids)
				})
				.collect();

			{
				let mut state = self.state.lock().unwrap();
				state.superpositions.insert(my_order, SuperPosition {
					default_residue: my_residue,
					increment,
					triggering_orders,
					actual_num_trash: 0,
				});
				state.hat_clued_orders.insert(my_order);
			}

			let implied_set = IdentitySet::from_iter(implied);
			let thought = &mut game.common.thoughts[my_order];
			thought.inferred = thought.inferred.intersect(&implied_set);
		}
	}

	fn evaluate_clue_score(game: &Game, clue: &BaseClue, target_index: usize) -> usize {
		let touched = IdentitySet::from_iter(touch_possibilities(clue, &game.state.variant));
		let mut score = 1usize;

		for &order in &game.state.hands[target_index] {
			if game.common.order_kt(&game.frame(), order) {
				continue;
			}

			let candidates = game.common.thoughts[order].possibilities();
			let new_candidates = match game.state.deck[order].id() {
				Some(id) if touched.contains(id) => candidates.intersect(&touched),
				Some(_) => candidates.difference(&touched),
				None => candidates,
			};
			score *= new_candidates.len().max(1);
		}

		score
	}
}

impl Convention for Encoder {
	fn interpret_clue(&self, _prev: &Game, game: &mut Game, action: &ClueAction) {
		self.process_hat_clue(game, action);
	}

	fn interpret_discard(&self, _prev: &Game, game: &mut Game, action: &DiscardAction) {
		let mut state = self.state.lock().unwrap();
		let mut resolved = Vec::new();

		for (&order, sp) in state.superpositions.iter_mut() {
			if sp.triggering_orders.remove(&action.order) {
				sp.actual_num_trash += 1;
				resolved.push(order);
			}
		}

		let mod_base = Self::mod_base(&game.state.variant, game.state.num_players).unwrap_or(12);
		for order in resolved {
			if let Some(sp) = state.superpositions.get(&order) {
				let candidates = IdentitySet::from_iter(sp.candidates());
				let thought = &mut game.common.thoughts[order];
				thought.inferred = thought.inferred.intersect(&candidates);

				if sp.residue(mod_base) == 0 {
					state.trashy_orders.insert(order);
				} else {
					state.trashy_orders.remove(&order);
				}
			}
		}

		state.superpositions.remove(&action.order);
	}

	fn interpret_play(&self, _prev: &Game, game: &mut Game, action: &PlayAction) {
		let mut state = self.state.lock().unwrap();
		let played_id = (action.suit_index >= 0 && action.rank >= 0).then_some(Identity { suit_index: action.suit_index as usize, rank: action.rank as usize });

		if let Some(id) = played_id {
			state.identities_called_to_play.remove(&id);
		}

		let mut resolved = Vec::new();
		for (&order, sp) in state.superpositions.iter_mut() {
			sp.triggering_orders.remove(&action.order);

			let still_triggering: Vec<usize> = sp.triggering_orders.iter().copied().collect();
			for trigger_order in still_triggering {
				let is_trash = game.common.order_kt(&game.frame(), trigger_order);
				let matches_played = game.state.deck[trigger_order].id() == played_id;
				if is_trash || matches_played {
					sp.actual_num_trash += 1;
					sp.triggering_orders.remove(&trigger_order);
					resolved.push(order);
				}
			}
		}

		let mod_base = Self::mod_base(&game.state.variant, game.state.num_players).unwrap_or(12);
		for order in resolved {
			if let Some(sp) = state.superpositions.get(&order) {
				let candidates = IdentitySet::from_iter(sp.candidates());
				let thought = &mut game.common.thoughts[order];
				thought.inferred = thought.inferred.intersect(&candidates);

				if sp.residue(mod_base) == 0 {
					state.trashy_orders.insert(order);
				} else {
					state.trashy_orders.remove(&order);
				}
			}
		}

		state.superpositions.remove(&action.order);
	}

	fn update_turn(&self, _prev: &Game, _game: &mut Game, _action: &TurnAction) {}

	fn take_action(&self, game: &Game) -> PerformAction {
		let our_index = game.state.our_player_index;
		let frame = game.frame();
		let common = &game.common;

		let trashy = self.state.lock().unwrap().trashy_orders.clone();

		for &order in &game.state.hands[our_index] {
			if trashy.contains(&order) {
				continue;
			}
			if common.order_kp(&frame, order) {
				return PerformAction::Play { table_id: None, target: order };
			}
		}

		if let Some(&order) = game.state.hands[our_index].iter().find(|&&o| trashy.contains(&o) || common.order_kt(&frame, o)) {
			return PerformAction::Discard { table_id: None, target: order };
		}

		if game.state.clue_tokens > 0 {
			let clues = self.find_all_clues(game, our_index);
			if let Some(clue) = clues.into_iter().next() {
				return clue;
			}
		}

		if game.state.clue_tokens == 8 {
			let fallback = game.state.hands[our_index][0];
			return PerformAction::Discard { table_id: None, target: fallback };
		}

		let worst = game.state.hands[our_index].iter().copied()
			.max_by_key(|&order| {
				let poss = common.thoughts[order].possibilities();
				poss.iter().filter(|id| !game.state.is_critical(*id)).count()
			})
			.unwrap_or(game.state.hands[our_index][0]);

		PerformAction::Discard { table_id: None, target: worst }
	}

	fn find_all_clues(&self, game: &Game, player_index: usize) -> Vec<PerformAction> {
		if game.state.current_player_index != player_index || game.state.clue_tokens == 0 {
			return Vec::new();
		}

		let variant = &game.state.variant;
		let Some(num_residues) = Self::num_residues_per_player(variant, game.state.num_players) else { return Vec::new() };
		let Some(identity_to_residue) = Self::identity_to_residue(game) else { return Vec::new() };

		let mut sum_of_residues = 0usize;
		for other in 0..game.state.num_players {
			if other == player_index {
				continue;
			}
			let Some(order) = self.leftmost_non_hat_clued(game, other) else { continue };
			let Some(identity) = game.state.deck[order].id() else { continue };

			if game.state.is_playable(identity) {
				let mut state = self.state.lock().unwrap();
				let dupe_ok = game.state.score() * 10 < game.state.max_score() * 6;
				if state.identities_called_to_play.contains(&identity) && dupe_ok {
					continue;
				}
				state.identities_called_to_play.insert(identity);
			}

			sum_of_residues += *identity_to_residue.get(&identity).unwrap_or(&0);
		}

		let mod_base = Self::mod_base(variant, game.state.num_players).unwrap_or(12);
		sum_of_residues %= mod_base;

		let target_index = (player_index + 1 + sum_of_residues / num_residues) % game.state.num_players;
		let raw_residue = sum_of_residues % num_residues;

		if target_index == player_index {
			return Vec::new();
		}

		if let Some(special) = Self::special_hat_clues(variant) {
			if let Some(clues) = special.get(&raw_residue) {
				let mut touching: Vec<BaseClue> = clues.iter().copied().filter(|clue| {
					!game.state.clue_touched(&game.state.hands[target_index], clue).is_empty()
				}).collect();

				if !touching.is_empty() {
					touching.sort_by_key(|clue| Self::evaluate_clue_score(game, clue, target_index));
					return touching.into_iter().map(|clue| match clue.kind {
						ClueKind::COLOUR => PerformAction::Colour { table_id: None, target: target_index, value: clue.value },
						ClueKind::RANK => PerformAction::Rank { table_id: None, target: target_index, value: clue.value },
					}).collect();
				}
			}
		}

		let is_rank = raw_residue < 2;

		if is_rank {
			let mut candidates: Vec<usize> = if is_brownish_pinkish(variant) {
				let values: Vec<usize> = if raw_residue == 0 { vec![1, 3, 5] } else { vec![2, 4] };
				values.into_iter().filter(|&value| {
					let clue = BaseClue { kind: ClueKind::RANK, value };
					!game.state.clue_touched(&game.state.hands[target_index], &clue).is_empty()
				}).collect()
			} else {
				let rightmost_unnumbered = Self::rightmost_unnumbered(game, target_index);
				let mut candidates: Vec<usize> = available_rank_clues(variant).into_iter().filter(|&value| {
					let clue = BaseClue { kind: ClueKind::RANK, value };
					!game.state.clue_touched(&game.state.hands[target_index], &clue).is_empty()
				}).collect();

				if let Some(unnumbered_order) = rightmost_unnumbered {
					candidates.retain(|&value| {
						let clue = BaseClue { kind: ClueKind::RANK, value };
						let touches = game.state.clue_touched(&game.state.hands[target_index], &clue).contains(&unnumbered_order);
						touches == (raw_residue == 0)
					});
				} else if raw_residue == 0 {
					candidates.sort();
					candidates.truncate(1);
				} else {
					candidates.sort();
					candidates.reverse();
					candidates.truncate(1);
				}

				candidates
			};

			candidates.sort_by_key(|&value| Self::evaluate_clue_score(game, &BaseClue { kind: ClueKind::RANK, value }, target_index));
			candidates.into_iter().map(|value| PerformAction::Rank { table_id: None, target: target_index, value }).collect()
		} else {
			let mut candidates: Vec<usize> = if is_whiteish_rainbowy(variant) {
				let num_colors = available_color_clues(variant);
				if ![2, 4, 5, 6].contains(&num_colors) {
					return Vec::new();
				}
				let values: Vec<usize> = if raw_residue == 2 { (0..num_colors / 2).collect() } else { (num_colors / 2..num_colors).collect() };
				values.into_iter().filter(|&value| {
					let clue = BaseClue { kind: ClueKind::COLOUR, value };
					!game.state.clue_touched(&game.state.hands[target_index], &clue).is_empty()
				}).collect()
			} else {
				let rightmost_uncolored = Self::rightmost_uncolored(game, target_index);
				let mut candidates: Vec<usize> = (0..colourable_suits(variant).len()).filter(|&value| {
					let clue = BaseClue { kind: ClueKind::COLOUR, value };
					!game.state.clue_touched(&game.state.hands[target_index], &clue).is_empty()
				}).collect();

				if let Some(uncolored_order) = rightmost_uncolored {
					candidates.retain(|&value| {
						let clue = BaseClue { kind: ClueKind::COLOUR, value };
						let touches = game.state.clue_touched(&game.state.hands[target_index], &clue).contains(&uncolored_order);
						touches == (raw_residue == 2)
					});
				} else if raw_residue == 2 {
					candidates.sort();
					candidates.truncate(1);
				} else {
					candidates.sort();
					candidates.reverse();
					candidates.truncate(1);
				}

				candidates
			};

			candidates.sort_by_key(|&value| Self::evaluate_clue_score(game, &BaseClue { kind: ClueKind::COLOUR, value }, target_index));
			candidates.into_iter().map(|value| PerformAction::Colour { table_id: None, target: target_index, value }).collect()
		}
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
	use std::sync::Arc;
	use crate::basics::action::Action;
	use crate::basics::state::State;
	use crate::basics::variant::VariantOpts;

	#[test]
	fn it_builds_the_6_suit_12_mod_table() {
		let table = mod_table(6, 12).unwrap();
		assert_eq!(table.len(), 12);
		assert_eq!(table[0], vec![ResidueSlot::Trash]);
		assert_eq!(table[1], vec![ResidueSlot::Playable]);
	}

	#[test]
	fn unsupported_suit_count_has_no_table() {
		assert!(mod_table(7, 12).is_none());
	}

	fn no_variant() -> Arc<Variant> {
		Arc::new(Variant::new(0, "No Variant", &["Red", "Yellow", "Green", "Blue", "Purple"], &["r", "y", "g", "b", "p"], VariantOpts::default()))
	}

	/// A 2-player game with Bob (index 1) holding 4 drawn cards, so each order has a true deck
	/// identity for `evaluate_clue_score` to key off of. Returns the game and Bob's index.
	fn bob_hand_game(ids: [Identity; 4]) -> (Game, usize) {
		let state = State::new(vec!["Alice".to_string(), "Bob".to_string()], 0, no_variant());
		let mut game = Game::new(0, state, false, Arc::new(Encoder::new()));

		for (order, id) in ids.into_iter().enumerate() {
			game.handle_action(&Action::draw(1, order, id.suit_index as i32, id.rank as i32));
		}

		(game, 1)
	}

	fn set_candidates(game: &mut Game, order: usize, ids: &[Identity]) {
		let set = IdentitySet::from_iter(ids.iter().copied());
		game.common.thoughts[order].possible = set;
		game.common.thoughts[order].inferred = set;
	}

	#[test]
	fn evaluate_clue_score_keys_on_true_identity_not_first_candidate() {
		let ids = [
			Identity { suit_index: 0, rank: 3 },
			Identity { suit_index: 2, rank: 3 },
			Identity { suit_index: 0, rank: 1 },
			Identity { suit_index: 1, rank: 2 },
		];
		let (mut game, target) = bob_hand_game(ids);

		// Orders 0 and 1's true identities (r3, g3) are touched by a rank-3 clue; orders 2
		// and 3 are not. Keying off an arbitrary first candidate instead of the true identity
		// would route order 0 or 1 through the wrong (difference) branch.
		set_candidates(&mut game, 0, &[Identity { suit_index: 0, rank: 3 }, Identity { suit_index: 1, rank: 3 }]);
		set_candidates(&mut game, 1, &[Identity { suit_index: 2, rank: 3 }, Identity { suit_index: 3, rank: 3 }]);
		set_candidates(&mut game, 2, &[Identity { suit_index: 0, rank: 1 }, Identity { suit_index: 1, rank: 1 }]);
		set_candidates(&mut game, 3, &[Identity { suit_index: 1, rank: 2 }]);

		let score = Encoder::evaluate_clue_score(&game, &BaseClue { kind: ClueKind::RANK, value: 3 }, target);
		assert_eq!(score, 2 * 2 * 2 * 1);
	}

	#[test]
	fn evaluate_clue_score_keys_on_true_identity_for_a_colour_clue() {
		let ids = [
			Identity { suit_index: 0, rank: 3 },
			Identity { suit_index: 2, rank: 3 },
			Identity { suit_index: 0, rank: 1 },
			Identity { suit_index: 1, rank: 2 },
		];
		let (mut game, target) = bob_hand_game(ids);

		// Orders 0 and 2's true identities are Red; a colour-0 (Red) clue touches them and
		// not orders 1 or 3.
		set_candidates(&mut game, 0, &[Identity { suit_index: 0, rank: 3 }, Identity { suit_index: 0, rank: 4 }, Identity { suit_index: 0, rank: 5 }]);
		set_candidates(&mut game, 1, &[Identity { suit_index: 2, rank: 3 }, Identity { suit_index: 2, rank: 4 }, Identity { suit_index: 2, rank: 5 }]);
		set_candidates(&mut game, 2, &[Identity { suit_index: 0, rank: 1 }]);
		set_candidates(&mut game, 3, &[Identity { suit_index: 1, rank: 2 }]);

		let score = Encoder::evaluate_clue_score(&game, &BaseClue { kind: ClueKind::COLOUR, value: 0 }, target);
		assert_eq!(score, 3 * 3 * 1 * 1);
	}

	#[test]
	fn interpret_clue_does_not_panic_when_no_residue_table_exists_for_this_player_count() {
		let ids = [
			Identity { suit_index: 0, rank: 1 },
			Identity { suit_index: 1, rank: 1 },
			Identity { suit_index: 2, rank: 1 },
			Identity { suit_index: 3, rank: 1 },
		];
		let (mut game, bob) = bob_hand_game(ids);
		let prev = game.clone();

		// 2 players has no hat-guessing residue table (modulus_for only covers 4/5/6); Bob
		// clueing Alice (not the observer) must hit that boundary and return, not unwrap a None.
		let action = ClueAction {
			giver: bob,
			target: 0,
			list: vec![0],
			clue: BaseClue { kind: ClueKind::RANK, value: 1 },
		};

		Encoder::new().interpret_clue(&prev, &mut game, &action);
	}
}
