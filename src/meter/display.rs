//! 测量进度显示

use std::io::Write;

/// 测量进度的显示层
///
/// 运行器在数据块到达和速率采样时回调，实现方决定渲染方式
pub trait MeterDisplay {
    /// 累计接收量更新（每个数据块到达时）
    fn on_bytes(&mut self, total_mb: f64);
    /// 新的瞬时速率采样
    fn on_rate(&mut self, mbps: f64);
}

/// 控制台单行刷新显示
#[derive(Default)]
pub struct ConsoleDisplay {
    last_mbps: f64,
}

impl MeterDisplay for ConsoleDisplay {
    fn on_bytes(&mut self, total_mb: f64) {
        print!(
            "\r已接收 {:.2} MB    瞬时速率 {:.2} Mbit/s    ",
            total_mb, self.last_mbps
        );
        let _ = std::io::stdout().flush();
    }

    fn on_rate(&mut self, mbps: f64) {
        self.last_mbps = mbps;
    }
}

/// 不输出任何内容
#[derive(Default)]
pub struct SilentDisplay;

impl MeterDisplay for SilentDisplay {
    fn on_bytes(&mut self, _total_mb: f64) {}
    fn on_rate(&mut self, _mbps: f64) {}
}
