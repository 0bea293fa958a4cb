use std::time::Duration;

use crate::block::Block;
use crate::coordinator::TranslationReport;

/// 一次 `translate` 运行的统计信息
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub parse_time: Duration,
    pub cache_open_time: Duration,
    pub translation_time: Duration,
    pub render_time: Duration,
    pub file_write_time: Duration,
    pub input_size: usize,
    pub output_size: usize,
    pub blocks_parsed: usize,
    pub blocks_targeted: usize,
    pub report: TranslationReport,
}

impl RunStats {
    /// 按块类型统计数量，保持首次出现的顺序
    pub fn kind_counts(blocks: &[Block]) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for block in blocks {
            let name = block.kind.name();
            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }
        counts
    }

    pub fn cache_hit_rate(&self) -> Option<f64> {
        let lookups = self.report.cache_hits + self.report.cache_misses;
        if lookups == 0 {
            None
        } else {
            Some(self.report.cache_hits as f64 / lookups as f64)
        }
    }
}

/// 打印性能统计
pub fn print_performance_stats(stats: &RunStats, total_duration: Duration) {
    println!("\n📊 性能统计报告:");
    println!("═══════════════════════════════════════");

    println!("⏱️  时间分解:");
    println!("   文档解析: {}", format_duration(stats.parse_time));
    println!("   缓存打开: {}", format_duration(stats.cache_open_time));
    println!("   翻译执行: {}", format_duration(stats.translation_time));
    println!("   文档重组: {}", format_duration(stats.render_time));
    println!("   文件写入: {}", format_duration(stats.file_write_time));
    println!("   总耗时: {}", format_duration(total_duration));

    println!("\n📏 文件统计:");
    println!(
        "   输入大小: {} 字节 ({:.1} KB)",
        stats.input_size,
        stats.input_size as f64 / 1024.0
    );
    println!(
        "   输出大小: {} 字节 ({:.1} KB)",
        stats.output_size,
        stats.output_size as f64 / 1024.0
    );
    if stats.input_size > 0 {
        println!(
            "   大小变化: {:.1}%",
            (stats.output_size as f64 / stats.input_size as f64 - 1.0) * 100.0
        );
    }

    println!("\n🔤 翻译统计:");
    println!("   解析块数: {} 个", stats.blocks_parsed);
    println!("   翻译目标: {} 个", stats.blocks_targeted);
    println!("   完成任务: {} 个", stats.report.completed);
    println!("   结构校验未通过: {} 个", stats.report.invalid_translations);
    if stats.report.has_failures() {
        println!("   失败: {} 个", stats.report.failures.len());
    }

    if let Some(rate) = stats.cache_hit_rate() {
        println!("\n💾 缓存统计:");
        println!("   缓存命中: {} 次", stats.report.cache_hits);
        println!("   缓存未命中: {} 次", stats.report.cache_misses);
        println!("   重复写入: {} 次", stats.report.duplicate_inserts);
        println!("   命中率: {:.1}%", rate * 100.0);
    }

    let secs = total_duration.as_secs_f64();
    if secs > 0.0 {
        println!("\n🚀 性能指标:");
        println!(
            "   处理速度: {:.1} KB/s",
            stats.input_size as f64 / 1024.0 / secs
        );
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_markdown;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn test_kind_counts() {
        let blocks = parse_markdown("# A\n\nB\n\n- c\n- d").unwrap();
        let counts = RunStats::kind_counts(&blocks);
        assert_eq!(
            counts,
            vec![("Heading", 1), ("Blank", 2), ("Paragraph", 1), ("Item", 2)]
        );
    }

    #[test]
    fn test_cache_hit_rate() {
        let mut stats = RunStats::default();
        assert_eq!(stats.cache_hit_rate(), None);

        stats.report.cache_hits = 3;
        stats.report.cache_misses = 1;
        assert_eq!(stats.cache_hit_rate(), Some(0.75));
    }
}
