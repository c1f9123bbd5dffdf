/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - リクエスト単位の認証コンテキスト（AuthContext）を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - AuthContext
 * - CurrentAuth
 */

mod core;
mod types;

pub use core::CurrentAuth;
pub use types::AuthContext;
