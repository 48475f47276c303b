use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};

use crate::dto::SpinMessage;
use crate::models::survey::SurveyAnswers;
use crate::services::outcome::{self, Spin, SpinConfig};
use crate::services::scoring;
use crate::AppState;

#[derive(Debug, Clone, Copy)]
pub struct SpinSettings {
    pub spin: SpinConfig,
    pub answers_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum SpinRequestError {
    #[error("connection closed before answers were sent")]
    Closed,

    #[error("no answers received within {0:?}")]
    TimedOut(Duration),

    #[error("invalid answers: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// GET /ws/spin
///
/// The client sends one text frame with its answers; the server streams tick
/// frames for the spin window, then a single result frame, then closes.
/// Closing the socket early cancels the spin.
pub async fn spin_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let settings = SpinSettings {
        spin: state.spin_config(),
        answers_timeout: state.config.spin_answers_timeout(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, settings))
}

async fn handle_socket(socket: WebSocket, settings: SpinSettings) {
    let (sender, receiver) = socket.split();
    run_session(sender, receiver, settings, outcome::random_draw).await;
}

/// Waits for the first text frame and parses it as answers. Other frames
/// before it are skipped.
pub async fn read_answers<R, E>(
    receiver: &mut R,
    wait: Duration,
) -> Result<SurveyAnswers, SpinRequestError>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    let first_text = async {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
        None
    };

    let text = tokio::time::timeout(wait, first_text)
        .await
        .map_err(|_| SpinRequestError::TimedOut(wait))?
        .ok_or(SpinRequestError::Closed)?;

    Ok(serde_json::from_str(&text)?)
}

async fn send_message<S>(sender: &mut S, msg: &SpinMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode spin frame");
            false
        }
    }
}

async fn run_session<S, R, E, F>(mut sender: S, mut receiver: R, settings: SpinSettings, draw: F)
where
    S: Sink<Message> + Unpin + Send + 'static,
    <S as Sink<Message>>::Error: Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send + 'static,
    F: FnMut() -> u32 + Send + 'static,
{
    let answers = match read_answers(&mut receiver, settings.answers_timeout).await {
        Ok(answers) => answers,
        Err(SpinRequestError::Closed) => return,
        Err(e) => {
            tracing::warn!(error = %e, "Spin request rejected");
            send_message(&mut sender, &SpinMessage::Error { error: e.to_string() }).await;
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    let probability = scoring::score(&answers);
    tracing::debug!(probability, "Spin started");

    let mut spin = Spin::start(probability, settings.spin, draw);

    // Dropping `spin` (task end or abort) cancels any pending draw.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = spin.next_frame().await {
            if !send_message(&mut sender, &SpinMessage::from_frame(frame, probability)).await {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => {
            tracing::debug!("Spin cancelled by client");
            send_task.abort();
        }
    }
}
