use rust_bot::basics::clue::ClueKind;
use rust_bot::hgroup::HGroup;
use std::sync::Arc;

use crate::util::{pre_clue, Player, TestClue, TestOptions};

pub mod util;
pub mod ex_asserts;

#[test]
fn chop_is_the_oldest_untouched_card() {
	let hgroup = Arc::new(HGroup::new());
	let game = util::setup(hgroup.clone(), &[
		&["xx", "xx", "xx", "xx", "xx"],
		&["g1", "p1", "g2", "b2", "p4"],
		&["b1", "g3", "p2", "r5", "g5"],
	], TestOptions::default());

	let bob_hand = game.state.hands[Player::Bob as usize].clone();

	// Bob's chop is his oldest card (slot 5, his "p4").
	assert_eq!(hgroup.chop(&game, Player::Bob as usize), Some(bob_hand[4]));
}

#[test]
fn focus_prefers_the_touched_chop_over_a_leftmost_tiebreak() {
	let hgroup = Arc::new(HGroup::new());
	let game = util::setup(hgroup.clone(), &[
		&["xx", "xx", "xx", "xx", "xx"],
		&["g1", "p1", "g2", "b2", "p4"],
		&["b1", "g3", "p2", "r5", "g5"],
	], TestOptions::default());

	let bob_hand = game.state.hands[Player::Bob as usize].clone();

	// A rank-1 clue touches Bob's "g1" (slot 1) and "p1" (slot 2); neither is his chop ("p4",
	// slot 5), so the focus falls to the leftmost (most recently drawn) of the two: "g1".
	let touched = vec![bob_hand[1], bob_hand[0]];
	assert_eq!(hgroup.focus_of_clue(&game, Player::Bob as usize, &touched), Some(bob_hand[0]));
}

#[test]
fn chop_is_none_once_the_whole_hand_is_touched() {
	let hgroup = Arc::new(HGroup::new());
	let mut game = util::setup(hgroup.clone(), &[
		&["xx", "xx", "xx", "xx", "xx"],
		&["g1", "p1", "g2", "b2", "p4"],
		&["b1", "g3", "p2", "r5", "g5"],
	], TestOptions::default());

	// Bob's hand is green, purple, green, blue, purple (slots 1-5); colour-clue each with its
	// own suit so every `pre_clue` call actually touches the card it's tagging.
	for (slot, suit_index) in [(1, 2), (2, 4), (3, 2), (4, 3), (5, 4)] {
		pre_clue(&mut game, Player::Bob, slot, &[TestClue { kind: ClueKind::COLOUR, value: suit_index, giver: Player::Alice }]);
	}

	let bob_hand = game.state.hands[Player::Bob as usize].clone();

	assert_eq!(hgroup.chop(&game, Player::Bob as usize), None);

	// With no chop left, the focus of a clue touching two non-chop slots falls back to the
	// leftmost (most recently drawn) touched slot.
	let touched = vec![bob_hand[2], bob_hand[0]];
	assert_eq!(hgroup.focus_of_clue(&game, Player::Bob as usize, &touched), Some(bob_hand[0]));
}
