//! 打包器实现.

pub mod ac3;
pub mod text_subs;
pub mod vobsub;

pub use ac3::Ac3Packetizer;
pub use text_subs::TextSubsPacketizer;
pub use vobsub::VobSubPacketizer;
