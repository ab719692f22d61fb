//! Integration tests for the bughouse piece economy
//!
//! Drives whole recorded games through the replay controller and checks
//! the cross-board invariants that make bughouse bughouse: captures feed
//! the partner board's reserve, promoted pieces demote back to pawns,
//! stepping backward is an exact inverse, and no piece ever enters or
//! leaves a match.

use std::fmt::Write;
use std::time::Duration;

use bughouse_analysis::{
    BoardId, BoardRecord, RecordedGame, ReplayController, TimeControl, TimedMove,
};
use shakmaty::{Color, Position, Role};

/// Builds a recorded two-board game from (text, timestamp) pairs.
fn recorded(a: &[(&str, u64)], b: &[(&str, u64)]) -> RecordedGame {
    let timed = |list: &[(&str, u64)]| {
        list.iter()
            .map(|&(text, at)| TimedMove::at(text, at))
            .collect()
    };
    RecordedGame {
        time_control: TimeControl::new(180_000, 0),
        board_a: BoardRecord {
            white: "alice".into(),
            black: "bob".into(),
            moves: timed(a),
        },
        board_b: BoardRecord {
            white: "carol".into(),
            black: "dave".into(),
            moves: timed(b),
        },
    }
}

/// A game that exercises every kind of piece movement the economy has:
/// captures on both boards, drops from the farmed reserve, a capturing
/// promotion and the recapture that demotes it.
fn eventful_game() -> RecordedGame {
    recorded(
        &[
            ("a4", 1_000),
            ("b5", 2_000),
            ("axb5", 3_000),
            ("a6", 4_000),
            ("bxa6", 5_000),
            ("e6", 6_000),
            ("a7", 7_000),
            ("e5", 8_000),
            ("axb8=Q", 9_000),
            ("Rxb8", 10_000),
        ],
        &[
            ("Nf3", 5_500),
            ("Nf6", 6_500),
            ("d4", 7_500),
            ("P@e4", 8_500),
            ("e3", 9_500),
            ("N@b4", 10_500),
        ],
    )
}

/// Everything observable about the replay at its current cursor,
/// flattened for exact comparisons across undo and redo.
fn fingerprint(replay: &ReplayController) -> String {
    let snapshot = replay.snapshot();
    let mut out = String::new();
    for id in BoardId::ALL {
        let clocks = snapshot.clocks(id);
        let _ = write!(
            out,
            "{}|{:?}/{:?}|",
            snapshot.fen(id),
            clocks.white,
            clocks.black
        );
        for sq in snapshot.promoted(id) {
            let _ = write!(out, "{}", sq);
        }
        for side in [Color::White, Color::Black] {
            for (role, n) in snapshot.reserve(id, side).iter() {
                let _ = write!(out, "{}{}", role.upper_char(), n);
            }
        }
        let _ = write!(
            out,
            "|{}:{};",
            replay.taken(id, Color::White),
            replay.taken(id, Color::Black)
        );
    }
    out
}

#[test]
fn test_captures_credit_the_partner_reserve_on_both_boards() {
    // A pawn falls on each board; each one lands in the reserve of the
    // capturing side's partner, which here is black both times.
    let game = recorded(
        &[("e4", 1_000), ("d5", 2_000), ("exd5", 3_000)],
        &[("d4", 1_100), ("e5", 2_100), ("dxe5", 3_100)],
    );
    let mut replay = ReplayController::new(&game);
    while replay.step_forward().unwrap() {}

    let snapshot = replay.snapshot();
    assert_eq!(snapshot.reserve(BoardId::B, Color::Black).count(Role::Pawn), 1);
    assert_eq!(snapshot.reserve(BoardId::A, Color::Black).count(Role::Pawn), 1);
    assert!(snapshot.reserve(BoardId::A, Color::White).is_empty());
    assert!(snapshot.reserve(BoardId::B, Color::White).is_empty());

    assert_eq!(replay.taken(BoardId::A, Color::White), 1);
    assert_eq!(replay.taken(BoardId::B, Color::White), 1);
    assert_eq!(replay.taken(BoardId::A, Color::Black), 0);
    assert_eq!(replay.taken(BoardId::B, Color::Black), 0);
}

#[test]
fn test_the_match_never_gains_or_loses_material() {
    // Two chess sets enter the match and two chess sets stay in it, no
    // matter how many captures, drops and promotions move them around.
    let mut replay = ReplayController::new(&eventful_game());

    let check_totals = |replay: &ReplayController| {
        let snapshot = replay.snapshot();
        assert_eq!(snapshot.material_total(Role::Pawn), 32);
        assert_eq!(snapshot.material_total(Role::Knight), 8);
        assert_eq!(snapshot.material_total(Role::Bishop), 8);
        assert_eq!(snapshot.material_total(Role::Rook), 8);
        assert_eq!(snapshot.material_total(Role::Queen), 4);
        assert_eq!(snapshot.material_total(Role::King), 4);
    };

    check_totals(&replay);
    while replay.step_forward().unwrap() {
        check_totals(&replay);
    }
    assert!(replay.at_end());
    while replay.step_backward() {
        check_totals(&replay);
    }
    assert!(replay.at_start());
}

#[test]
fn test_stepping_back_restores_every_field() {
    // Fingerprint each position on the way forward, then require the
    // identical fingerprints on the way back: boards, reserves,
    // promoted squares, clocks and ledger all have to return exactly.
    let mut replay = ReplayController::new(&eventful_game());

    let mut trail = vec![fingerprint(&replay)];
    while replay.step_forward().unwrap() {
        trail.push(fingerprint(&replay));
    }
    assert_eq!(trail.len(), replay.len() + 1);

    while replay.step_backward() {
        assert_eq!(fingerprint(&replay), trail[replay.index()]);
    }
    assert_eq!(fingerprint(&replay), trail[0]);

    // and forward again over the healed state
    while replay.step_forward().unwrap() {
        assert_eq!(fingerprint(&replay), trail[replay.index()]);
    }
}

#[test]
fn test_jumping_matches_single_stepping() {
    let game = eventful_game();
    let mut stepper = ReplayController::new(&game);
    for target in 0..=stepper.len() {
        let mut jumper = ReplayController::new(&game);
        jumper.jump_to(target).unwrap();
        stepper.jump_to(target).unwrap();
        assert_eq!(fingerprint(&jumper), fingerprint(&stepper));
    }
}

#[test]
fn test_recorded_timestamps_drive_the_clocks() {
    // Board A only: white moves at 1s and 4.5s, black at 3s, on a
    // three-minute clock with no increment.
    let game = recorded(
        &[("e4", 1_000), ("e5", 3_000), ("Nf3", 4_500)],
        &[],
    );
    let mut replay = ReplayController::new(&game);
    while replay.step_forward().unwrap() {}

    let clocks = replay.snapshot().clocks(BoardId::A);
    assert_eq!(clocks.white, Duration::from_millis(180_000 - 1_000 - 1_500));
    assert_eq!(clocks.black, Duration::from_millis(180_000 - 2_000));
    // board B never moved and never spent time
    assert_eq!(
        replay.snapshot().clocks(BoardId::B).white,
        Duration::from_millis(180_000)
    );

    assert_eq!(
        replay.elapsed_per_move(),
        [
            Duration::from_millis(1_000),
            Duration::from_millis(2_000),
            Duration::from_millis(1_500),
        ]
    );
}

#[test]
fn test_promoted_piece_hands_over_a_pawn() {
    let mut replay = ReplayController::new(&eventful_game());
    while replay.step_forward().unwrap() {}

    let snapshot = replay.snapshot();
    // white farmed two pawns and a knight on board A; black's only
    // capture was the promoted queen, which demotes to the pawn it was
    assert_eq!(replay.taken(BoardId::A, Color::White), 5);
    assert_eq!(replay.taken(BoardId::A, Color::Black), 1);
    assert_eq!(snapshot.reserve(BoardId::B, Color::White).count(Role::Pawn), 1);
    assert_eq!(snapshot.reserve(BoardId::B, Color::White).count(Role::Queen), 0);

    // the mark died with the piece
    assert!(snapshot.promoted(BoardId::A).is_empty());
}

#[test]
fn test_drops_consume_exactly_what_was_farmed() {
    let mut replay = ReplayController::new(&eventful_game());
    while replay.step_forward().unwrap() {}

    let snapshot = replay.snapshot();
    // board A fed black three pieces (P, P, N); the drops spent one
    // pawn and the knight
    assert_eq!(snapshot.reserve(BoardId::B, Color::Black).count(Role::Pawn), 1);
    assert_eq!(snapshot.reserve(BoardId::B, Color::Black).count(Role::Knight), 0);

    // both dropped pieces are standing on board B
    let board_b = snapshot.board(BoardId::B);
    assert_eq!(
        board_b.board().piece_at(shakmaty::Square::E4).map(|p| p.role),
        Some(Role::Pawn)
    );
    assert_eq!(
        board_b.board().piece_at(shakmaty::Square::B4).map(|p| p.role),
        Some(Role::Knight)
    );
}
