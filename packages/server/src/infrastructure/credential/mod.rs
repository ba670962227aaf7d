//! 資格情報ストアの実装
//!
//! - `hasher`: ソルト付き一方向ハッシュ（平文のパスワードは保存も比較もしない）
//! - `inmemory`: インメモリのアカウント表（任意で JSON ファイルに書き出す）

pub mod hasher;
pub mod inmemory;

pub use inmemory::InMemoryCredentialStore;
