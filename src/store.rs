//! Conversation store.
//!
//! All conversation mutations go through `Store::dispatch`, which returns the
//! side effects the app has to carry out (start or stop an assistant reply).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SubmitPrompt(String),
    AssistantChunk(String),
    AssistantFinished,
    RegenerateReply,
    ClearConversation,
    DismissStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestReply { prompt: String },
    CancelReply,
}

#[derive(Debug, Default)]
pub struct ChatState {
    messages: Vec<Message>,
    awaiting_reply: bool,
    status: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    state: ChatState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state.awaiting_reply
    }

    pub fn status(&self) -> Option<&str> {
        self.state.status.as_deref()
    }

    /// The most recent message, if it is an assistant reply
    pub fn last_assistant(&self) -> Option<&Message> {
        self.state
            .messages
            .last()
            .filter(|m| m.role == Role::Assistant)
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::SubmitPrompt(prompt) => self.submit(prompt),
            Action::AssistantChunk(chunk) => {
                if !self.state.awaiting_reply {
                    tracing::debug!("Dropping assistant chunk, no reply pending");
                    return vec![];
                }
                if let Some(msg) = self.last_assistant_mut() {
                    msg.content.push_str(&chunk);
                }
                vec![]
            }
            Action::AssistantFinished => {
                self.state.awaiting_reply = false;
                vec![]
            }
            Action::RegenerateReply => self.regenerate(),
            Action::ClearConversation => {
                let was_awaiting = self.state.awaiting_reply;
                self.state.messages.clear();
                self.state.awaiting_reply = false;
                self.state.status = Some("Conversation cleared".to_string());
                if was_awaiting {
                    vec![Effect::CancelReply]
                } else {
                    vec![]
                }
            }
            Action::DismissStatus => {
                self.state.status = None;
                vec![]
            }
        }
    }

    fn submit(&mut self, prompt: String) -> Vec<Effect> {
        let prompt = prompt.trim().to_string();
        if prompt.is_empty() {
            self.state.status = Some("Nothing to send".to_string());
            return vec![];
        }
        if self.state.awaiting_reply {
            self.state.status = Some("Wait for the current reply to finish".to_string());
            return vec![];
        }

        self.push(Role::User, prompt.clone());
        self.push(Role::Assistant, String::new());
        self.state.awaiting_reply = true;
        self.state.status = None;
        vec![Effect::RequestReply { prompt }]
    }

    fn regenerate(&mut self) -> Vec<Effect> {
        if self.state.awaiting_reply {
            self.state.status = Some("Wait for the current reply to finish".to_string());
            return vec![];
        }

        let prompt = match self.state.messages.iter().rev().find(|m| m.role == Role::User) {
            Some(m) => m.content.clone(),
            None => {
                self.state.status = Some("Nothing to regenerate".to_string());
                return vec![];
            }
        };

        match self.last_assistant_mut() {
            Some(msg) => msg.content.clear(),
            None => self.push(Role::Assistant, String::new()),
        }
        self.state.awaiting_reply = true;
        self.state.status = None;
        vec![Effect::RequestReply { prompt }]
    }

    fn push(&mut self, role: Role, content: String) {
        self.state.messages.push(Message { role, content });
    }

    fn last_assistant_mut(&mut self) -> Option<&mut Message> {
        self.state
            .messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant)
    }
}
