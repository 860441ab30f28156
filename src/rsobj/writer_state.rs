/// 写入器状态机，只由轮转 worker 自己迁移。
/// 轮转中与已关闭分开表示，不复用同一个标志位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Running,
    Rotating,
    Closed,
}
