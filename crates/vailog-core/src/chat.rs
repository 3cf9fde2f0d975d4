//! Chat transcript state for the assistant screen.
//!
//! `ChatSession` owns the visible messages and the last error. It does no I/O:
//! `begin_send` hands back the payload for `/ai/chat`, and the caller reports
//! the outcome with `receive_reply` or `receive_error`.

use crate::models::{ChatMessage, Role, WireMessage};

pub const GREETING: &str = "Olá! Sou sua assistente de decisões para a transportadora. \
Pergunte sobre preços por km, roteirização, custos, contratos e alocação de motoristas \
que eu te ajudo com comparativos e cenários.";

pub const ERROR_REPLY: &str = "Desculpe, houve um erro ao processar sua pergunta.";

pub const EMPTY_CONVERSATION: &str = "Conversa vazia.";

pub const SUGGESTIONS: [&str; 5] = [
    "Vale a pena aceitar frete a R$ 3,80/km nesta rota?",
    "Como reduzir custo de combustível na rota SP → RJ?",
    "Melhor alocar 2 ou 3 motoristas no turno noturno?",
    "Devo comprar pneus agora ou aguardar próxima safra?",
    "Qual impacto do diesel +5% no meu custo por km?",
];

/// Suggestions are offered until the conversation grows past this many messages
const SUGGESTION_MESSAGE_LIMIT: usize = 2;

#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    /// Message of the last failed call, shown above the input
    pub error: Option<String>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            error: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn show_suggestions(&self) -> bool {
        self.messages.len() <= SUGGESTION_MESSAGE_LIMIT
    }

    /// Append the user's message and return the transcript to send.
    /// Blank input is ignored: nothing is appended and `None` is returned.
    pub fn begin_send(&mut self, text: &str) -> Option<Vec<WireMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.error = None;
        self.messages.push(ChatMessage::user(text));
        Some(self.messages.iter().map(ChatMessage::to_wire).collect())
    }

    pub fn receive_reply(&mut self, reply: String) {
        self.messages.push(ChatMessage::assistant(reply));
    }

    pub fn receive_error(&mut self, message: String) {
        self.error = Some(message);
        self.messages.push(ChatMessage::assistant(ERROR_REPLY));
    }

    /// Replace the transcript with a conversation from the history.
    pub fn load_conversation(&mut self, messages: Vec<WireMessage>) {
        self.error = None;
        self.messages = messages
            .into_iter()
            .map(|m| ChatMessage::new(m.role, m.content))
            .collect();
        if self.messages.is_empty() {
            self.messages.push(ChatMessage::new(Role::Assistant, EMPTY_CONVERSATION));
        }
    }
}
