//! Tests for decoding oracle responses and building move bodies.

use serde_json::json;
use vsai_client::{
    AiMode, Coord, Mark, MoveSubmission, MoveTarget, Mover, Occupant, OracleErrorKind, PieceKind,
    PlayerSide, SessionContext, SessionToken, Variant, Winner, decode_ai_mode, decode_stats,
    decode_update, decode_valid_moves, move_body,
};

fn session(variant: Variant) -> SessionContext {
    SessionContext::new(
        SessionToken::new("sess-1"),
        variant,
        PlayerSide::White,
        AiMode(0),
    )
}

#[test]
fn test_tictactoe_update_with_ai_move() {
    let body = json!({
        "board": [["O", "", ""], ["", "X", ""], ["", "", ""]],
        "game_over": false,
        "winner": null,
        "player_turn": true,
        "move": {"row": 1, "col": 1}
    });
    let update = decode_update(&session(Variant::TicTacToe), &body).unwrap();

    assert_eq!(update.board.get(Coord::new(0, 0)), Some(Occupant::mark(Mark::O)));
    assert_eq!(update.board.get(Coord::new(1, 1)), Some(Occupant::mark(Mark::X)));
    assert_eq!(update.board.get(Coord::new(2, 2)), None);
    assert!(update.outcome.player_turn);
    assert_eq!(update.outcome.winner, Winner::None);

    let last = update.last_move.unwrap();
    assert_eq!(last.by, Mover::Opponent);
    assert_eq!(last.to, MoveTarget::Cell(Coord::new(1, 1)));
}

#[test]
fn test_checkers_integer_codes_and_capture() {
    let mut rows = vec![vec![0; 8]; 8];
    rows[0][1] = 2;
    rows[7][0] = 3;
    let body = json!({
        "board": rows,
        "player_turn": true,
        "game_over": false,
        "captured": [[3, 2]],
        "last_move": {"from": [5, 4], "to": [4, 3], "player": "ai"}
    });
    let update = decode_update(&session(Variant::Checkers), &body).unwrap();

    assert_eq!(
        update.board.get(Coord::new(0, 1)),
        Some(Occupant::piece(Mark::Black, PieceKind::Man))
    );
    assert_eq!(
        update.board.get(Coord::new(7, 0)),
        Some(Occupant::piece(Mark::White, PieceKind::King))
    );
    assert!(update.captured);
    let last = update.last_move.unwrap();
    assert_eq!(last.by, Mover::Opponent);
    assert_eq!(last.from, Some(Coord::new(5, 4)));
    // The response flag is the player's capture, not the AI reply's.
    assert!(!last.captured);
}

#[test]
fn test_player_annotation_takes_response_capture() {
    let mut rows = vec![vec![0; 8]; 8];
    rows[3][2] = 1;
    let body = json!({
        "board": rows,
        "player_turn": false,
        "game_over": false,
        "captured": true,
        "last_move": {"from": [5, 4], "to": [3, 2], "player": "player"}
    });
    let last = decode_update(&session(Variant::Checkers), &body)
        .unwrap()
        .last_move
        .unwrap();
    assert_eq!(last.by, Mover::Player);
    assert!(last.captured);
}

#[test]
fn test_out_of_range_annotation_is_dropped() {
    let mut rows = vec![vec![0; 8]; 8];
    rows[0][1] = 2;
    let body = json!({
        "board": rows,
        "player_turn": true,
        "game_over": false,
        "last_move": {"from": [256, 1], "to": [4, 3], "player": "ai"}
    });
    let update = decode_update(&session(Variant::Checkers), &body).unwrap();
    assert!(update.last_move.is_none());

    let empty = vec![vec![""; 3]; 3];
    let body = json!({
        "board": empty,
        "player_turn": true,
        "game_over": false,
        "move": {"row": 1, "col": 300}
    });
    let update = decode_update(&session(Variant::TicTacToe), &body).unwrap();
    assert!(update.last_move.is_none());
}

#[test]
fn test_checkers_object_cells_seat_player_and_ai() {
    let mut rows = vec![vec![serde_json::Value::Null; 8]; 8];
    rows[5][0] = json!({"piece": "O", "king": false});
    rows[0][1] = json!({"piece": "X", "king": true});
    let body = json!({"board": rows, "player_turn": true, "game_over": false});

    let update = decode_update(&session(Variant::Checkers), &body).unwrap();
    assert_eq!(
        update.board.get(Coord::new(5, 0)),
        Some(Occupant::piece(Mark::White, PieceKind::Man))
    );
    assert_eq!(
        update.board.get(Coord::new(0, 1)),
        Some(Occupant::piece(Mark::Black, PieceKind::King))
    );

    let black = SessionContext::new(
        SessionToken::new("sess-2"),
        Variant::Checkers,
        PlayerSide::Black,
        AiMode(0),
    );
    let update = decode_update(&black, &body).unwrap();
    assert_eq!(
        update.board.get(Coord::new(5, 0)),
        Some(Occupant::piece(Mark::Black, PieceKind::Man))
    );

    rows[2][2] = json!({"piece": "Z", "king": false});
    let bad = json!({"board": rows, "player_turn": true, "game_over": false});
    assert!(decode_update(&session(Variant::Checkers), &bad).is_err());
}

#[test]
fn test_chess_object_cells() {
    let mut rows = vec![vec![serde_json::Value::Null; 8]; 8];
    rows[7][4] = json!({"piece": "K", "color": "white"});
    rows[0][3] = json!({"piece": "Q", "color": "black"});
    let body = json!({"board": rows, "player_turn": false, "game_over": false});
    let update = decode_update(&session(Variant::Chess), &body).unwrap();

    assert_eq!(
        update.board.get(Coord::new(7, 4)),
        Some(Occupant::piece(Mark::White, PieceKind::King))
    );
    assert_eq!(
        update.board.get(Coord::new(0, 3)),
        Some(Occupant::piece(Mark::Black, PieceKind::Queen))
    );
    assert!(!update.outcome.player_turn);
}

#[test]
fn test_winner_decoding() {
    let empty = vec![vec![""; 3]; 3];
    let decode = |winner: serde_json::Value| {
        let body = json!({"board": empty, "player_turn": false, "game_over": true, "winner": winner});
        decode_update(&session(Variant::TicTacToe), &body)
            .unwrap()
            .outcome
            .winner
    };
    assert_eq!(decode(json!("O")), Winner::Player);
    assert_eq!(decode(json!("X")), Winner::Opponent);
    assert_eq!(decode(json!("draw")), Winner::Draw);
    assert_eq!(decode(json!(null)), Winner::Draw);
}

#[test]
fn test_error_field_is_a_rejection() {
    let body = json!({"error": "Invalid move"});
    let err = decode_update(&session(Variant::TicTacToe), &body).unwrap_err();
    assert_eq!(err.kind, OracleErrorKind::Rejected);
    assert_eq!(err.message, "Invalid move");
    assert!(err.is_rejection());
}

#[test]
fn test_malformed_boards_are_transport_failures() {
    let short = json!({"board": [["", "", ""]], "player_turn": true});
    let err = decode_update(&session(Variant::TicTacToe), &short).unwrap_err();
    assert_eq!(err.kind, OracleErrorKind::Transport);

    let bad_cell = json!({"board": [["Z", "", ""], ["", "", ""], ["", "", ""]], "player_turn": true});
    assert!(decode_update(&session(Variant::TicTacToe), &bad_cell).is_err());

    let no_turn = json!({"board": [["", "", ""], ["", "", ""], ["", "", ""]]});
    assert!(decode_update(&session(Variant::TicTacToe), &no_turn).is_err());
}

#[test]
fn test_valid_moves_keys_and_metadata() {
    let body = json!({
        "valid_moves": {
            "4,3": [],
            "3,2": [[4, 3]],
            "0,0": {"promotion": true}
        }
    });
    let moves = decode_valid_moves(&body).unwrap();
    assert_eq!(moves.len(), 3);
    assert!(!*moves[&Coord::new(4, 3)].capture());
    assert!(*moves[&Coord::new(3, 2)].capture());
    assert!(*moves[&Coord::new(0, 0)].promotion());

    assert!(decode_valid_moves(&json!({"valid_moves": {"x": []}})).is_err());
    assert!(decode_valid_moves(&json!({})).unwrap().is_empty());
}

#[test]
fn test_ai_mode_and_stats() {
    assert_eq!(decode_ai_mode(&json!({"success": true}), AiMode(3)).unwrap(), AiMode(3));
    assert_eq!(decode_ai_mode(&json!({"ai_mode": 1}), AiMode(3)).unwrap(), AiMode(1));

    let stats = decode_stats(&json!({
        "total_games": 10,
        "player_wins": 4,
        "ai_wins": 5,
        "draws": 1,
        "win_rate": 40.0
    }))
    .unwrap();
    assert_eq!(stats.total_games, 10);
    assert_eq!(stats.ai_wins, 5);
    assert_eq!(decode_stats(&json!({})).unwrap().total_games, 0);
}

#[test]
fn test_move_body_per_input_mode() {
    let placement = MoveSubmission {
        origin: None,
        target: MoveTarget::Cell(Coord::new(2, 0)),
        promotion: None,
    };
    let body = move_body(&session(Variant::TicTacToe), &placement);
    assert_eq!(
        body,
        json!({"session_id": "sess-1", "game_type": "TicTacToe", "row": 2, "col": 0})
    );

    let drop = MoveSubmission {
        origin: None,
        target: MoveTarget::Column(6),
        promotion: None,
    };
    let body = move_body(&session(Variant::ConnectFour), &drop);
    assert_eq!(body["col"], 6);
    assert!(body.get("row").is_none());

    let promotion = MoveSubmission {
        origin: Some(Coord::new(1, 0)),
        target: MoveTarget::Cell(Coord::new(0, 0)),
        promotion: Some(PieceKind::Knight),
    };
    let body = move_body(&session(Variant::Chess), &promotion);
    assert_eq!(body["from_row"], 1);
    assert_eq!(body["to_col"], 0);
    assert_eq!(body["promotion_piece"], "N");
    assert_eq!(body["game_type"], "Chess");
}
