//! エンティティ

use super::value_object::{ConnectionId, SessionToken, Timestamp, Username};

/// 共有ドキュメント
///
/// プロセス内に 1 つだけ存在する。更新は常に全文置き換え（last-writer-wins）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
    updated_at: Timestamp,
}

impl Document {
    pub fn new(content: String, updated_at: Timestamp) -> Self {
        Self {
            content,
            updated_at,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// 本文を丸ごと置き換える
    pub fn replace(&mut self, content: String, updated_at: Timestamp) {
        self.content = content;
        self.updated_at = updated_at;
    }
}

/// 認証済みセッション
///
/// ログインに成功した接続ごとに 1 つ作成され、ログアウトまたは接続の終了で破棄される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub user: Username,
    /// セッションを作成した接続
    pub connection: ConnectionId,
    pub created_at: Timestamp,
}

impl Session {
    pub fn new(
        token: SessionToken,
        user: Username,
        connection: ConnectionId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            token,
            user,
            connection,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_replace_overwrites_content_and_timestamp() {
        // テスト項目: replace で本文と更新時刻が丸ごと置き換わる
        // given (前提条件):
        let mut document = Document::new("old".to_string(), Timestamp::new(1000));

        // when (操作):
        document.replace("new".to_string(), Timestamp::new(2000));

        // then (期待する結果):
        assert_eq!(document.content(), "new");
        assert_eq!(document.updated_at(), Timestamp::new(2000));
    }
}
