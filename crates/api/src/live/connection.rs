use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};

use storefront_auth::{Identity, Role};
use storefront_catalog::{NewFeedback, render_fragments};
use storefront_core::ProductId;
use storefront_infra::StoreError;

use crate::app::AppServices;
use crate::live::protocol::{Inbound, Outbound, ProtocolError, parse_inbound};

type Sink = SplitSink<WebSocket, Message>;

/// Why the receive loop stopped.
enum Exit {
    PeerGone,
    Protocol(ProtocolError),
    Storage(StoreError),
}

/// Run one live connection until the peer leaves or breaks the protocol.
///
/// Registration lasts exactly as long as this future: the hub entry is
/// removed on every exit path, including cancellation.
pub async fn serve_connection(
    socket: WebSocket,
    services: Arc<AppServices>,
    product_id: ProductId,
    identity: Identity,
) {
    let (registration, mut outbox) = services.live.register(product_id, identity.role());
    let connection_id = registration.connection_id();
    let (mut sink, mut stream) = socket.split();

    if identity.is_guest() && send(&mut sink, &Outbound::NotAuthorized).await.is_err() {
        return;
    }

    let exit = loop {
        tokio::select! {
            Some(message) = outbox.recv() => {
                if send(&mut sink, &message).await.is_err() {
                    break Exit::PeerGone;
                }
            }
            incoming = stream.next() => {
                let text = match incoming {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break Exit::PeerGone,
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    // Guests are told once and then ignored.
                    Some(Ok(_)) if identity.is_guest() => continue,
                    Some(Ok(Message::Binary(_))) => break Exit::Protocol(ProtocolError::Binary),
                    Some(Ok(Message::Text(text))) => text,
                };

                let inbound = match parse_inbound(&text, identity.role()) {
                    Ok(inbound) => inbound,
                    Err(e) => break Exit::Protocol(e),
                };

                match apply(&services, product_id, &identity, inbound).await {
                    Ok(None) => {}
                    Ok(Some(notice)) => {
                        if send(&mut sink, &notice).await.is_err() {
                            break Exit::PeerGone;
                        }
                    }
                    Err(e) => break Exit::Storage(e),
                }
            }
        }
    };

    match exit {
        Exit::PeerGone => {}
        Exit::Protocol(e) => {
            tracing::warn!(%product_id, connection_id, error = %e, "live protocol violation");
            close_with(&mut sink, &Outbound::InvalidValue).await;
        }
        Exit::Storage(e) => {
            tracing::error!(%product_id, connection_id, error = %e, "live channel storage failure");
            close_with(&mut sink, &Outbound::ServerError).await;
        }
    }
    drop(registration);
}

/// Persist one inbound operation and fan the result out to the product's
/// connections. `Ok(Some(_))` is a notice for the sender alone.
async fn apply(
    services: &AppServices,
    product_id: ProductId,
    identity: &Identity,
    inbound: Inbound,
) -> Result<Option<Outbound>, StoreError> {
    let hub = &services.live;
    let feedback = &services.stores.feedback;

    match inbound {
        Inbound::CreateFeedback {
            liked_text,
            disliked_text,
        } => {
            let created = feedback
                .create_feedback(NewFeedback {
                    product_id,
                    author_id: identity.id(),
                    liked_text,
                    disliked_text,
                })
                .await?;
            let fragments = render_fragments(&created);
            hub.broadcast(product_id, |role| Outbound::Created {
                feedback_html: match role {
                    Role::Admin => fragments.admin_html.clone(),
                    Role::User | Role::Guest => fragments.user_html.clone(),
                },
            });
        }
        Inbound::UpdateComment {
            feedback_id,
            admin_comment,
        } => {
            let updated = match feedback
                .set_admin_comment(product_id, feedback_id, &admin_comment)
                .await
            {
                Ok(updated) => updated,
                Err(StoreError::NotFound) => return Ok(Some(Outbound::FeedbackNotFound)),
                Err(e) => return Err(e),
            };
            let message = Outbound::Updated {
                feedback_id: updated.id,
                admin_comment: updated.admin_comment.unwrap_or_default(),
            };
            hub.broadcast(product_id, |_| message.clone());
        }
        Inbound::DeleteFeedback { feedback_id } => {
            match feedback.delete_feedback(product_id, feedback_id).await {
                Ok(()) => {}
                Err(StoreError::NotFound) => return Ok(Some(Outbound::FeedbackNotFound)),
                Err(e) => return Err(e),
            }
            let message = Outbound::Deleted { feedback_id };
            hub.broadcast(product_id, |_| message.clone());
        }
    }
    Ok(None)
}

async fn send(sink: &mut Sink, message: &Outbound) -> Result<(), axum::Error> {
    sink.send(Message::Text(message.to_text())).await
}

/// Report a final notice, then close. Failures here mean the peer is
/// already gone.
async fn close_with(sink: &mut Sink, message: &Outbound) {
    let _ = send(sink, message).await;
    let _ = sink.send(Message::Close(None)).await;
}
