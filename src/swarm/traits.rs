use crate::swarm::common::{AgentId, VelocityCommand};

/// 機体状態の取得と速度コマンド送出を担う外部プロバイダのインターフェース
///
/// 実機・シミュレータ双方の接続層がこのトレイトを実装します。
/// 返される位置は地上真値（グラウンドトゥルース）で、機体ごとの
/// 原点オフセットは呼び出し側（シーケンサ）が加算します。
pub trait IStateProvider {
    /// 機体の現在位置 (x, y, z) を取得
    fn get_position(&self, agent: AgentId) -> Result<(f64, f64, f64), ProviderError>;

    /// 機体の現在高度を取得
    fn get_altitude(&self, agent: AgentId) -> Result<f64, ProviderError>;

    /// 速度コマンドを送出（fire-and-forget）
    ///
    /// コマンドは短い持続時間付きで毎ティック再送出される前提です。
    /// 明示的なキャンセルは存在せず、送出を止めれば効力が切れます。
    fn send_velocity(&mut self, agent: AgentId, command: &VelocityCommand)
        -> Result<(), ProviderError>;
}

/// プロバイダ通信のエラー
///
/// 制御ループは厳しい周期で回るため、応答しないプロバイダへの
/// 再試行は行いません。古い位置情報に基づくコマンドは危険なので、
/// このエラーは当該ミッション実行全体の中断を意味します。
#[derive(Debug)]
pub enum ProviderError {
    /// プロバイダが応答しない、または対象機体の状態を返せない
    Unavailable(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Unavailable(msg) => {
                write!(f, "状態プロバイダが利用できません: {}", msg)
            }
        }
    }
}

impl std::error::Error for ProviderError {}
