//! HTTP implementation of the oracle.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::wire::{self, AiMoveRequest, ChangeAiModeRequest, NewGameRequest, ValidMovesRequest};
use super::{GameStats, GameUpdate, MoveSubmission, Oracle, SessionContext};
use crate::OracleError;
use crate::games::{AiMode, Coord, ValidMoves, Variant};

/// Oracle client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct RestOracle {
    base_url: String,
    client: reqwest::Client,
}

impl RestOracle {
    /// Creates a client for the server at `base_url`.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Creates a client whose requests fail after `timeout`.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref(), ?timeout))]
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Returns the server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[instrument(skip(self, body))]
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, OracleError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::read_body(response).await
    }

    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Value, OracleError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::read_body(response).await
    }

    /// Reads a body, preferring an `error` field over the HTTP status.
    async fn read_body(response: reqwest::Response) -> Result<Value, OracleError> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                warn!(%status, "Oracle returned an error status without a JSON body");
                return Err(OracleError::transport(format!("HTTP status {}", status)));
            }
        };

        wire::reject_on_error(&body)?;
        if !status.is_success() {
            warn!(%status, "Oracle returned an error status");
            return Err(OracleError::transport(format!("HTTP status {}", status)));
        }
        debug!(%status, "Oracle responded");
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Oracle for RestOracle {
    #[instrument(
        skip(self, session),
        fields(session = %session.token(), variant = %session.variant())
    )]
    async fn new_game(&self, session: &SessionContext) -> Result<GameUpdate, OracleError> {
        info!("Requesting new game");
        let path = session.variant().endpoints().new_game;
        let body = self.post(path, &NewGameRequest::new(session)).await?;
        wire::decode_update(session, &body)
    }

    #[instrument(skip(self, session), fields(session = %session.token(), %origin))]
    async fn valid_moves(
        &self,
        session: &SessionContext,
        origin: Coord,
    ) -> Result<ValidMoves, OracleError> {
        let request = ValidMovesRequest {
            session_id: session.token().as_str(),
            row: origin.row,
            col: origin.col,
            game_type: session.variant().game_type(),
        };
        let body = self
            .post(session.variant().endpoints().valid_moves, &request)
            .await?;
        let moves = wire::decode_valid_moves(&body)?;
        debug!(count = moves.len(), "Fetched valid moves");
        Ok(moves)
    }

    #[instrument(skip(self, session), fields(session = %session.token(), ?submission))]
    async fn make_move(
        &self,
        session: &SessionContext,
        submission: MoveSubmission,
    ) -> Result<GameUpdate, OracleError> {
        info!("Submitting move");
        let request = wire::move_body(session, &submission);
        let body = self
            .post(session.variant().endpoints().make_move, &request)
            .await?;
        wire::decode_update(session, &body)
    }

    #[instrument(skip(self, session), fields(session = %session.token()))]
    async fn ai_move(&self, session: &SessionContext) -> Result<GameUpdate, OracleError> {
        info!("Requesting AI move");
        let request = AiMoveRequest {
            session_id: session.token().as_str(),
            game_type: session.variant().game_type(),
            ai_mode: *session.ai_mode(),
        };
        let body = self
            .post(session.variant().endpoints().ai_move, &request)
            .await?;
        wire::decode_update(session, &body)
    }

    #[instrument(skip(self, session), fields(session = %session.token(), mode = mode.0))]
    async fn change_ai_mode(
        &self,
        session: &SessionContext,
        mode: AiMode,
    ) -> Result<AiMode, OracleError> {
        let request = ChangeAiModeRequest {
            session_id: session.token().as_str(),
            ai_mode: mode,
        };
        let body = self
            .post(session.variant().endpoints().change_ai_mode, &request)
            .await?;
        wire::decode_ai_mode(&body, mode)
    }

    #[instrument(skip(self))]
    async fn stats(&self, variant: Variant) -> Result<GameStats, OracleError> {
        let path = format!("{}?game_type={}", variant.endpoints().stats, variant.game_type());
        let body = self.get(&path).await?;
        wire::decode_stats(&body)
    }
}
