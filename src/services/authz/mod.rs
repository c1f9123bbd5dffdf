/*
 * Responsibility
 * - 認可 (Authorization)。認証 (Authentication) は middleware 側の責務
 * - リソースの所有者チェック (BOLA 対策) をここに閉じ込める
 */
pub mod ownership;

pub use ownership::OwnershipError;
