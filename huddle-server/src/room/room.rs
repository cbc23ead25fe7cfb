use crate::error::DirectoryError;
use crate::relay::EventOutput;
use crate::room::room_command::RoomCommand;
use crate::room::room_manager::RoomHandle;
use crate::room::session::Session;
use dashmap::DashMap;
use huddle_core::{ChatMessage, Participant, RoomId, ServerEvent, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Room actor. Every membership change, roster read and chat broadcast of a
/// room runs on this task, one command at a time.
pub(crate) struct Room {
    room_id: RoomId,
    instance: u64,

    /// Members in join order.
    members: Vec<Session>,

    command_rx: mpsc::Receiver<RoomCommand>,
    output: Arc<dyn EventOutput>,

    /// Directory table the room removes itself from once empty.
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    closed: bool,
}

impl Room {
    pub(crate) fn new(
        room_id: RoomId,
        instance: u64,
        command_rx: mpsc::Receiver<RoomCommand>,
        output: Arc<dyn EventOutput>,
        rooms: Arc<DashMap<RoomId, RoomHandle>>,
    ) -> Self {
        Self {
            room_id,
            instance,
            members: Vec::new(),
            command_rx,
            output,
            rooms,
            closed: false,
        }
    }

    pub(crate) async fn run(mut self) {
        info!("Room {} event loop started", self.room_id);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;

            if self.members.is_empty() {
                break;
            }
        }

        if !self.closed {
            self.shut_down();
        }
        info!("Room {} event loop finished", self.room_id);
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                session_id,
                display_name,
                reply,
            } => {
                let roster = self.join(session_id, display_name).await;
                let _ = reply.send(Ok(roster));
            }

            RoomCommand::Leave { session_id, reply } => {
                let remaining = self.leave(session_id).await;
                // Unpublish before replying so the leaver observes the room gone.
                if remaining == 0 {
                    self.shut_down();
                }
                let _ = reply.send(remaining);
            }

            RoomCommand::Chat {
                session_id,
                content,
                reply,
            } => {
                let message = self.chat(session_id, content).await;
                let _ = reply.send(message);
            }
        }
    }

    async fn join(&mut self, session_id: SessionId, display_name: String) -> Vec<Participant> {
        let roster: Vec<Participant> = self
            .members
            .iter()
            .filter(|m| m.session_id != session_id)
            .map(Session::participant)
            .collect();

        let rejoined = match self.members.iter_mut().find(|m| m.session_id == session_id) {
            Some(existing) => {
                existing.display_name = display_name.clone();
                true
            }
            None => {
                self.members.push(Session {
                    session_id,
                    room_id: self.room_id,
                    display_name: display_name.clone(),
                });
                false
            }
        };

        info!(
            "Session {} ({}) joined room {}, {} other member(s)",
            session_id,
            display_name,
            self.room_id,
            roster.len()
        );

        // The joiner must hold its snapshot before anyone learns about it.
        self.output
            .send_event(
                &session_id,
                ServerEvent::AllUsers {
                    users: roster.clone(),
                },
            )
            .await;

        if !rejoined {
            let joined = Participant::new(session_id, display_name);
            for member in &roster {
                self.output
                    .send_event(&member.session_id, ServerEvent::UserConnected(joined.clone()))
                    .await;
            }
        }

        roster
    }

    async fn leave(&mut self, session_id: SessionId) -> usize {
        let Some(pos) = self.members.iter().position(|m| m.session_id == session_id) else {
            return self.members.len();
        };
        let departed = self.members.remove(pos);

        info!(
            "Session {} ({}) left room {}",
            departed.session_id, departed.display_name, self.room_id
        );

        for member in &self.members {
            self.output
                .send_event(
                    &member.session_id,
                    ServerEvent::UserDisconnected { session_id },
                )
                .await;
        }

        self.members.len()
    }

    async fn chat(&self, session_id: SessionId, content: String) -> Option<ChatMessage> {
        let Some(sender) = self.members.iter().find(|m| m.session_id == session_id) else {
            warn!(
                "Chat from {} dropped, not a member of room {}",
                session_id, self.room_id
            );
            return None;
        };

        let message = ChatMessage::stamp(sender.display_name.clone(), content);
        info!(
            "Broadcasting message {} from {} in room {}",
            message.id, sender.display_name, self.room_id
        );

        for member in &self.members {
            self.output
                .send_event(&member.session_id, ServerEvent::ReceiveMessage(message.clone()))
                .await;
        }

        Some(message)
    }

    /// Unpublish the room, then answer whatever was already queued so the
    /// directory can retry those requests on a fresh room.
    fn shut_down(&mut self) {
        self.closed = true;
        let instance = self.instance;
        self.rooms
            .remove_if(&self.room_id, |_, handle| handle.instance == instance);
        self.command_rx.close();

        while let Ok(cmd) = self.command_rx.try_recv() {
            match cmd {
                RoomCommand::Join { reply, .. } => {
                    let _ = reply.send(Err(DirectoryError::RoomClosed(self.room_id)));
                }
                RoomCommand::Leave { reply, .. } => {
                    let _ = reply.send(0);
                }
                RoomCommand::Chat { reply, .. } => {
                    let _ = reply.send(None);
                }
            }
        }

        info!("Room {} is empty and was removed", self.room_id);
    }
}
