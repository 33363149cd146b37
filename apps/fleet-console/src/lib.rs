//! 无界面运维控制台：装配快照存储、轮询、编辑控制与命令流水线。

mod console;
mod notifier;

pub use console::{Console, ConsoleSettings};
pub use notifier::LogNotifier;
