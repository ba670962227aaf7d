//! Message formatting utilities for client display.

use kakiba_server::infrastructure::dto::wire::{AuthFailCode, ServerMessage};
use kakiba_shared::time::timestamp_to_jst_clock_time;

const RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a message received from the server
    ///
    /// # Arguments
    ///
    /// * `message` - The message to format
    /// * `received_at` - Unix timestamp when the message arrived (milliseconds)
    pub fn format_server_message(message: &ServerMessage, received_at: i64) -> String {
        match message {
            ServerMessage::DocState { content } => Self::format_document("Document", content),
            ServerMessage::EditUpdate { content } => {
                Self::format_document("Document updated", content)
            }
            ServerMessage::AuthSuccess {
                token: Some(_),
                user,
                ..
            } => format!(
                "\n* Logged in as {}\n",
                user.as_deref().unwrap_or("(unknown)")
            ),
            ServerMessage::AuthSuccess { message, .. } => {
                format!("\n* {}\n", message.as_deref().unwrap_or("Success."))
            }
            ServerMessage::AuthFail { reason, message } => Self::format_auth_fail(*reason, message),
            ServerMessage::Notification { message } => format!("\n[notice] {}\n", message),
            ServerMessage::ChatMessage { user, text } => {
                Self::format_chat_message(user, text, received_at)
            }
        }
    }

    /// Format the whole document between rules
    pub fn format_document(title: &str, content: &str) -> String {
        let mut output = format!("\n{}\n{}:\n{}\n", RULE, title, RULE);
        output.push_str(content);
        if !content.is_empty() && !content.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(RULE);
        output.push('\n');
        output
    }

    fn format_auth_fail(reason: AuthFailCode, message: &str) -> String {
        let code = match reason {
            AuthFailCode::NameTaken => "NAME_TAKEN",
            AuthFailCode::InvalidUsername => "INVALID_USERNAME",
            AuthFailCode::BadCredentials => "BAD_CREDENTIALS",
            AuthFailCode::AlreadyAuthenticated => "ALREADY_AUTHENTICATED",
            AuthFailCode::InvalidSession => "INVALID_SESSION",
            AuthFailCode::Internal => "INTERNAL",
        };
        format!("\n! {} ({})\n", message, code)
    }

    /// Format a chat message
    ///
    /// # Arguments
    ///
    /// * `from` - The sender's username
    /// * `text` - The message text
    /// * `received_at` - Unix timestamp when the message arrived (milliseconds)
    pub fn format_chat_message(from: &str, text: &str, received_at: i64) -> String {
        format!(
            "\n[{}] @{}: {}\n",
            timestamp_to_jst_clock_time(received_at),
            from,
            text
        )
    }

    /// Local command reference
    pub fn format_help() -> String {
        [
            "Commands:",
            "  /signup <user> <password>  create an account",
            "  /login <user> <password>   log in",
            "  /logout                    log out and disconnect",
            "  /edit <text>               replace the document (\\n for newlines)",
            "  /append <text>             add a line at the end of the document",
            "  /save                      save the document on the server",
            "  /new                       save and start a new document",
            "  /show                      print the local copy of the document",
            "  /help                      show this help",
            "  /quit                      exit",
            "Anything else is sent as chat.",
        ]
        .join("\n")
            + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01 12:34:56 JST
    const NOON_JST: i64 = 1_704_080_096_000;

    #[test]
    fn test_format_document_between_rules() {
        // テスト項目: ドキュメント本文が罫線に挟まれて表示される
        // given (前提条件):
        let message = ServerMessage::DocState {
            content: "line 1\nline 2".to_string(),
        };

        // when (操作):
        let result = MessageFormatter::format_server_message(&message, NOON_JST);

        // then (期待する結果):
        assert!(result.contains("Document:"));
        assert!(result.contains("line 1\nline 2\n"));
        assert_eq!(result.matches(RULE).count(), 3);
    }

    #[test]
    fn test_format_login_and_signup_success() {
        // テスト項目: ログイン成功とサインアップ成功が区別して表示される
        // given (前提条件):
        let login = ServerMessage::AuthSuccess {
            token: Some("abc".to_string()),
            user: Some("alice".to_string()),
            message: None,
        };
        let signup = ServerMessage::AuthSuccess {
            token: None,
            user: None,
            message: Some("Signup successful! Please log in.".to_string()),
        };

        // when (操作):
        let login = MessageFormatter::format_server_message(&login, NOON_JST);
        let signup = MessageFormatter::format_server_message(&signup, NOON_JST);

        // then (期待する結果):
        assert!(login.contains("Logged in as alice"));
        assert!(!login.contains("abc"));
        assert!(signup.contains("Signup successful! Please log in."));
    }

    #[test]
    fn test_format_auth_fail() {
        // テスト項目: 認証失敗がメッセージと理由コード付きで表示される
        // given (前提条件):
        let message = ServerMessage::AuthFail {
            reason: AuthFailCode::NameTaken,
            message: "Username already exists.".to_string(),
        };

        // when (操作):
        let result = MessageFormatter::format_server_message(&message, NOON_JST);

        // then (期待する結果):
        assert!(result.contains("Username already exists. (NAME_TAKEN)"));
    }

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージが受信時刻と送信者付きで表示される
        // given (前提条件):
        let message = ServerMessage::ChatMessage {
            user: "bob".to_string(),
            text: "hi".to_string(),
        };

        // when (操作):
        let result = MessageFormatter::format_server_message(&message, NOON_JST);

        // then (期待する結果):
        assert_eq!(result, "\n[12:34:56] @bob: hi\n");
    }

    #[test]
    fn test_format_help_lists_commands() {
        // テスト項目: ヘルプに全コマンドが含まれる
        // given (前提条件):
        let commands = [
            "/signup", "/login", "/logout", "/edit", "/append", "/save", "/new", "/show",
            "/help", "/quit",
        ];

        // when (操作):
        let result = MessageFormatter::format_help();

        // then (期待する結果):
        for command in commands {
            assert!(result.contains(command), "missing {}", command);
        }
    }
}
