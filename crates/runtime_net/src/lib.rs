// crates/runtime_net/src/lib.rs
use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc::{Receiver, Sender},
};
use std::thread::{self, JoinHandle};

use bus::{CoreCommand, CoreEvent, RequestFailure};
use core_types::SessionId;
use net::{RenderTransport, RetryFailure, RetryPolicy};

/// Execute render commands on background threads until the command channel closes.
///
/// Every request runs on its own thread, so responses may arrive out of order; the
/// editor sequences them by request id.
pub fn start_render_runtime(
    cmd_rx: Receiver<CoreCommand>,
    evt_tx: Sender<CoreEvent>,
    transport: Arc<dyn RenderTransport>,
    retry: RetryPolicy,
) -> JoinHandle<()> {
    thread::spawn(move || {
        // one cancel flag per editing session
        let mut cancels: HashMap<SessionId, Arc<AtomicBool>> = HashMap::new();

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                CoreCommand::Render {
                    session_id,
                    request_id,
                    request,
                } => {
                    let cancel = cancels
                        .entry(session_id)
                        .or_insert_with(|| Arc::new(AtomicBool::new(false)))
                        .clone();
                    let evt_tx = evt_tx.clone();
                    let transport = Arc::clone(&transport);

                    thread::spawn(move || {
                        let identifier = request.identifier.clone();
                        let outcome = retry.run(&cancel, |attempt| {
                            log::debug!(target: "runtime_net", "render `{identifier}` session={session_id} request={request_id} attempt={attempt}");
                            transport.render(&request)
                        });
                        if cancel.load(Ordering::Acquire) {
                            log::debug!(target: "runtime_net", "dropping response for cancelled session {session_id}");
                            return;
                        }
                        let evt = match outcome {
                            Ok(Some(result)) => CoreEvent::Rendered {
                                session_id,
                                request_id,
                                result,
                            },
                            Ok(None) => CoreEvent::RequestFailed {
                                session_id,
                                request_id,
                                failure: RequestFailure::NoWidget(identifier),
                            },
                            Err(failure) => match to_request_failure(failure) {
                                Some(failure) => CoreEvent::RequestFailed {
                                    session_id,
                                    request_id,
                                    failure,
                                },
                                None => return,
                            },
                        };
                        let _ = evt_tx.send(evt);
                    });
                }

                CoreCommand::Preview {
                    session_id,
                    request_id,
                    identifier,
                    instance,
                    id_to_use,
                } => {
                    let cancel = cancels
                        .entry(session_id)
                        .or_insert_with(|| Arc::new(AtomicBool::new(false)))
                        .clone();
                    let evt_tx = evt_tx.clone();
                    let transport = Arc::clone(&transport);

                    thread::spawn(move || {
                        let outcome =
                            retry.run(&cancel, |_| transport.preview(&identifier, &instance, id_to_use));
                        if cancel.load(Ordering::Acquire) {
                            return;
                        }
                        let evt = match outcome {
                            Ok(Some(markup)) => CoreEvent::PreviewReady {
                                session_id,
                                request_id,
                                markup,
                            },
                            Ok(None) => CoreEvent::RequestFailed {
                                session_id,
                                request_id,
                                failure: RequestFailure::NoWidget(identifier),
                            },
                            Err(failure) => match to_request_failure(failure) {
                                Some(failure) => CoreEvent::RequestFailed {
                                    session_id,
                                    request_id,
                                    failure,
                                },
                                None => return,
                            },
                        };
                        let _ = evt_tx.send(evt);
                    });
                }

                CoreCommand::CancelSession { session_id } => {
                    if let Some(flag) = cancels.remove(&session_id) {
                        flag.store(true, Ordering::Release);
                    }
                }
            }
        }
        log::debug!(target: "runtime_net", "command channel closed; render runtime exiting");
    })
}

fn to_request_failure(failure: RetryFailure) -> Option<RequestFailure> {
    match failure {
        RetryFailure::Cancelled => None,
        RetryFailure::Exhausted { attempts, error } => {
            log::warn!(target: "runtime_net", "render request failed after {attempts} attempt(s): {error}");
            Some(if error.is_retryable() {
                RequestFailure::Transport {
                    attempts,
                    message: error.to_string(),
                }
            } else {
                RequestFailure::BadResponse(error.to_string())
            })
        }
    }
}
