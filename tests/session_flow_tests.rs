//! Integration tests for the analysis session command surface
//!
//! Drives the session the way a frontend would: load a recorded game,
//! browse it, branch off variations, and run the promotion and drop
//! dialogs end to end. Each test checks the session from the outside
//! only, through commands and accessors.

use bughouse_analysis::{
    reduce, AnalysisSession, AttemptedMove, BoardId, BoardRecord, DropViolation, MoveError,
    MoveOutcome, NodeId, NodeIdFactory, RecordedGame, SessionCommand, SessionError, TimeControl,
    TimedMove,
};
use shakmaty::{Color, Role, Square};

fn session() -> AnalysisSession {
    AnalysisSession::with_ids(TimeControl::new(120_000, 0), NodeIdFactory::with_tag(0x51de))
}

fn normal(board: BoardId, from: Square, to: Square) -> AttemptedMove {
    AttemptedMove::Normal {
        board,
        from,
        to,
        promotion: None,
    }
}

fn committed(outcome: MoveOutcome) -> NodeId {
    match outcome {
        MoveOutcome::Committed(node) => node,
        other => panic!("expected Committed, got {:?}", other),
    }
}

/// Three half-moves on board A that win a pawn, one on board B. After
/// loading, black holds a pawn on board B and it is black's turn there.
fn pawn_winning_game() -> RecordedGame {
    RecordedGame {
        time_control: TimeControl::new(60_000, 0),
        board_a: BoardRecord {
            white: "alice".into(),
            black: "bob".into(),
            moves: vec![
                TimedMove::at("e4", 1_000),
                TimedMove::at("d5", 2_000),
                TimedMove::at("exd5", 3_000),
            ],
        },
        board_b: BoardRecord {
            white: "carol".into(),
            black: "dave".into(),
            moves: vec![TimedMove::at("Nf3", 3_500)],
        },
    }
}

/// Board A marched to the eve of promotion: white to move, pawn on a7,
/// the b8 knight in reach.
fn promotion_ready_game() -> RecordedGame {
    let texts = ["a4", "b5", "axb5", "a6", "bxa6", "e6", "a7", "e5"];
    RecordedGame {
        time_control: TimeControl::new(60_000, 0),
        board_a: BoardRecord {
            white: "alice".into(),
            black: "bob".into(),
            moves: texts
                .iter()
                .enumerate()
                .map(|(i, t)| TimedMove::at(*t, 1_000 * (i as u64 + 1)))
                .collect(),
        },
        board_b: BoardRecord::default(),
    }
}

#[test]
fn test_loading_a_game_lands_on_the_mainline_tip() {
    let mut session = session();
    let loaded = session.load_game(&pawn_winning_game()).unwrap();
    assert_eq!(loaded, 4);

    assert_eq!(session.cursor(), session.tree().mainline_tip());
    assert_eq!(session.time_control(), TimeControl::new(60_000, 0));

    let sans: Vec<String> = session
        .moves_to_cursor()
        .into_iter()
        .map(|m| m.san)
        .collect();
    assert_eq!(sans, ["e4", "d5", "exd5", "Nf3"]);

    // the farmed pawn is visible at the cursor
    assert_eq!(
        session
            .cursor_position()
            .reserve(BoardId::B, Color::Black)
            .count(Role::Pawn),
        1
    );
}

#[test]
fn test_displayed_clocks_come_from_the_recorded_times() {
    let mut session = session();
    session.load_game(&pawn_winning_game()).unwrap();

    // on the mainline the anchor is the cursor itself
    let clocks = session.displayed_clocks();
    assert_eq!(
        clocks[BoardId::A].white,
        std::time::Duration::from_millis(60_000 - 1_000 - 1_000)
    );
    assert_eq!(
        clocks[BoardId::A].black,
        std::time::Duration::from_millis(60_000 - 1_000)
    );
    assert_eq!(
        clocks[BoardId::B].white,
        std::time::Duration::from_millis(60_000 - 3_500)
    );
}

#[test]
fn test_browsing_a_variation_freezes_the_clock_anchor() {
    let mut session = session();
    session.load_game(&pawn_winning_game()).unwrap();

    // walk back onto an interior mainline node
    session.nav_back();
    session.nav_back();
    let departure = session.cursor();
    let mainline_clocks = session.displayed_clocks();

    // branch off and keep going inside the variation
    session
        .try_move(normal(BoardId::A, Square::G1, Square::F3))
        .unwrap();
    session
        .try_move(normal(BoardId::A, Square::G8, Square::F6))
        .unwrap();

    assert_ne!(session.cursor(), departure);
    assert_eq!(session.nav().clock_anchor(), departure);
    assert_eq!(session.displayed_clocks(), mainline_clocks);

    // stepping back onto the mainline resumes tracking
    session.nav_back();
    session.nav_back();
    assert_eq!(session.cursor(), departure);
    assert_eq!(session.nav().clock_anchor(), departure);
}

#[test]
fn test_forward_opens_a_selector_where_the_game_branches() {
    let mut session = session();
    session.load_game(&pawn_winning_game()).unwrap();

    // put a variation next to the first mainline move
    while session.nav_back() {}
    let root = session.cursor();
    assert_eq!(root, session.tree().root_id());
    let variation = committed(
        session
            .try_move(normal(BoardId::A, Square::D2, Square::D4))
            .unwrap(),
    );
    session.nav_back();

    // root now has two children: stepping forward asks instead of
    // picking silently
    assert!(session.nav_forward());
    assert_eq!(session.cursor(), root);
    let selector = session.selector().expect("selector should be open");
    assert_eq!(selector.node, root);
    // the highlight starts on the mainline child
    assert_eq!(session.tree().main_child(root), Some(session.tree().children(root)[selector.index]));

    session.selector_move(1);
    assert!(session.selector_accept());
    assert_eq!(session.cursor(), variation);
    assert!(session.selector().is_none());

    // dismissal leaves the cursor alone
    session.nav_back();
    session.nav_forward();
    assert!(session.selector_dismiss());
    assert_eq!(session.cursor(), root);
}

#[test]
fn test_promotion_dialog_end_to_end() {
    let mut session = session();
    session.load_game(&promotion_ready_game()).unwrap();

    let outcome = session
        .try_move(normal(BoardId::A, Square::A7, Square::B8))
        .unwrap();
    let pending = match outcome {
        MoveOutcome::PromotionPending(pending) => pending,
        other => panic!("expected PromotionPending, got {:?}", other),
    };
    assert_eq!(pending.choices, [Role::Queen, Role::Rook, Role::Bishop, Role::Knight]);
    // nothing is on the board yet
    assert_eq!(session.tree().len(), 9);

    let node = committed(session.choose_promotion(Role::Queen).unwrap());
    let played = session.tree().get(node).unwrap().incoming.clone().unwrap();
    assert_eq!(played.san, "axb8=Q");
    assert!(session.cursor_position().promoted(BoardId::A).contains(Square::B8));
    // the captured knight crossed over
    assert_eq!(
        session
            .cursor_position()
            .reserve(BoardId::B, Color::Black)
            .count(Role::Knight),
        1
    );

    // black recaptures; the promoted queen hands over only a pawn
    session
        .try_move(normal(BoardId::A, Square::A8, Square::B8))
        .unwrap();
    let position = session.cursor_position();
    assert!(position.promoted(BoardId::A).is_empty());
    assert_eq!(position.reserve(BoardId::B, Color::White).count(Role::Pawn), 1);
    assert_eq!(position.reserve(BoardId::B, Color::White).count(Role::Queen), 0);
}

#[test]
fn test_drop_dialog_end_to_end() {
    let mut session = session();
    session.load_game(&pawn_winning_game()).unwrap();

    // kings can never be dropped
    let err = session.begin_drop(BoardId::B, Role::King).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Move(MoveError::IllegalDrop {
            violation: DropViolation::KingDrop,
            ..
        })
    ));

    // black holds a pawn, not a queen
    let err = session.begin_drop(BoardId::B, Role::Queen).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Move(MoveError::IllegalDrop {
            violation: DropViolation::EmptyReserve,
            ..
        })
    ));

    session.begin_drop(BoardId::B, Role::Pawn).unwrap();
    assert_eq!(session.pending_drop().unwrap().side, Color::Black);

    // g1 is empty but pawns may not stand on the first rank
    let err = session.complete_drop(Square::G1).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Move(MoveError::IllegalDrop {
            violation: DropViolation::PawnOnEdgeRank,
            ..
        })
    ));
    // the selection survives a rejected square
    assert!(session.pending_drop().is_some());

    let node = committed(session.complete_drop(Square::E4).unwrap());
    let played = session.tree().get(node).unwrap().incoming.clone().unwrap();
    assert_eq!(played.san, "P@e4");
    assert!(session.pending_drop().is_none());
    assert!(session
        .cursor_position()
        .reserve(BoardId::B, Color::Black)
        .is_empty());
}

#[test]
fn test_failed_load_leaves_the_session_untouched() {
    let mut session = session();
    session.load_game(&pawn_winning_game()).unwrap();
    let cursor = session.cursor();
    let len = session.tree().len();
    let control = session.time_control();

    let broken = RecordedGame {
        time_control: TimeControl::new(15_000, 0),
        board_a: BoardRecord {
            white: "alice".into(),
            black: "bob".into(),
            moves: vec![TimedMove::at("e4", 1_000), TimedMove::at("Ke4", 2_000)],
        },
        board_b: BoardRecord::default(),
    };
    let err = session.load_game(&broken).unwrap_err();
    match err {
        SessionError::Load(load) => {
            assert_eq!(load.index, 1);
            assert_eq!(load.board, BoardId::A);
        }
        other => panic!("expected Load, got {:?}", other),
    }

    assert_eq!(session.cursor(), cursor);
    assert_eq!(session.tree().len(), len);
    assert_eq!(session.time_control(), control);
}

#[test]
fn test_a_command_stream_reduces_to_a_session() {
    let commands = vec![
        SessionCommand::ApplyMove(normal(BoardId::A, Square::E2, Square::E4)),
        // rejected: the square is empty now
        SessionCommand::ApplyMove(normal(BoardId::A, Square::E2, Square::E4)),
        SessionCommand::ApplyMove(normal(BoardId::B, Square::D2, Square::D4)),
        SessionCommand::NavBack,
        SessionCommand::ApplyMove(normal(BoardId::B, Square::G1, Square::F3)),
    ];
    let final_session = commands.into_iter().fold(session(), reduce);

    // e4 committed, then two alternatives for white's first move on B
    assert_eq!(final_session.tree().len(), 4);
    let sans: Vec<String> = final_session
        .moves_to_cursor()
        .into_iter()
        .map(|m| m.san)
        .collect();
    assert_eq!(sans, ["e4", "Nf3"]);
    assert!(!final_session
        .tree()
        .is_on_mainline(final_session.cursor()));
}
