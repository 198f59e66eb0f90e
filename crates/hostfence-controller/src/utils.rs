//! 控制平面工具函数

use std::time::Duration;

/// 格式化持续时间为人类可读的字符串
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        return format!("{} 毫秒", millis);
    }

    let seconds = duration.as_secs();
    if seconds < 60 {
        return format!("{}.{:03} 秒", seconds, duration.subsec_millis());
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} 分钟 {} 秒", minutes, seconds % 60);
    }

    let hours = minutes / 60;
    format!("{} 小时 {} 分钟", hours, minutes % 60)
}

/// 将多份清单拼接为一个 YAML 多文档流
pub fn join_documents<I, S>(documents: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for doc in documents {
        out.push_str("---\n");
        let doc = doc.as_ref().trim_end();
        out.push_str(doc);
        out.push('\n');
    }
    out
}
