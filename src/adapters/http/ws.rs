use std::time::Instant;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::http::state::HttpState;
use crate::application::dto::FrameMessage;
use crate::domain::verdict::ImageSize;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(st): State<HttpState>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, st))
}

/// One live session: frames are processed to completion in arrival
/// order; a send failure or close ends only this session.
async fn handle_session(mut socket: WebSocket, st: HttpState) {
    let session_id: String = Uuid::new_v4().simple().to_string()[..8].to_string();
    info!(session = %session_id, "realtime session opened");

    while let Some(msg) = socket.recv().await {
        let data = match msg {
            Ok(Message::Binary(data)) => data,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        let started = Instant::now();
        let img = match image::load_from_memory(&data) {
            Ok(img) => img.to_rgb8(),
            Err(_) => {
                // Bad frame: report inline and keep the session alive.
                let reply = FrameMessage::decode_error();
                if send_json(&mut socket, &reply).await.is_err() {
                    break;
                }
                continue;
            }
        };
        let (width, height) = img.dimensions();

        let review = match st.inspection.process_frame(&img, &session_id).await {
            Ok(review) => review,
            Err(e) => {
                warn!(session = %session_id, error = %e, "frame processing failed");
                break;
            }
        };

        let reply = FrameMessage {
            boxes: review.kept.iter().map(|d| d.bbox).collect(),
            classes: review.kept.iter().map(|d| d.cls).collect(),
            confidences: review.kept.iter().map(|d| d.confidence).collect(),
            counts: review.counts,
            final_verdict: review.final_verdict,
            inference_time: started.elapsed().as_secs_f32() * 1000.0,
            image_size: ImageSize { width, height },
            error: None,
        };
        debug!(session = %session_id, ms = reply.inference_time, "frame processed");
        if send_json(&mut socket, &reply).await.is_err() {
            break;
        }
    }

    info!(session = %session_id, "realtime session closed");
}

async fn send_json(socket: &mut WebSocket, reply: &FrameMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(reply).unwrap_or_default();
    socket.send(Message::Text(json)).await
}
