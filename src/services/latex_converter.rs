//! LaTeX 公式替换服务 - 业务能力层
//!
//! 在任意文本中按分隔符找出公式片段，逐个渲染成 SVG 并原位替换，
//! 公式以外的文本保持不变。

use crate::clients::{InputFormat, MathRenderer};
use crate::error::ConvertError;
use regex::Regex;
use std::ops::Range;
use std::sync::{Arc, LazyLock};
use tokio::task::JoinSet;
use tracing::{debug, error};

/// 行内显示样式
const INLINE_STYLE: &str = "display: inline; vertical-align: middle;";

/// 公式分隔符，按替换顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `\( ... \)`
    InlineParen,
    /// `\[ ... \]`
    DisplayBracket,
    /// `$$ ... $$`
    DisplayDollar,
    /// `$ ... $`
    InlineDollar,
}

/// 片段不跨行：`\n`、`\r`、U+2028、U+2029 都视为行结束
static PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"\\\(([^\n\r\x{2028}\x{2029}]*?)\\\)",
        r"\\\[([^\n\r\x{2028}\x{2029}]*?)\\\]",
        r"\$\$([^\n\r\x{2028}\x{2029}]*?)\$\$",
        r"\$([^\n\r\x{2028}\x{2029}]*?)\$",
    ]
    .map(|pattern| Regex::new(pattern).expect("分隔符正则无效"))
});

impl Delimiter {
    /// 固定的替换顺序
    pub const ALL: [Delimiter; 4] = [
        Delimiter::InlineParen,
        Delimiter::DisplayBracket,
        Delimiter::DisplayDollar,
        Delimiter::InlineDollar,
    ];

    pub fn pattern(self) -> &'static Regex {
        &PATTERNS[self as usize]
    }
}

/// 一次扫描中找到的公式片段
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fragment {
    /// 整个匹配（含分隔符）在文本中的位置
    span: Range<usize>,
    /// 分隔符内的 LaTeX
    latex: String,
}

/// LaTeX → SVG 替换服务
///
/// 职责：
/// - 依次执行四种分隔符的扫描
/// - 同一次扫描内的公式并发渲染，按原顺序替换
/// - 单个公式渲染失败时保留原文
#[derive(Clone)]
pub struct LatexConverter {
    renderer: Arc<dyn MathRenderer>,
}

impl LatexConverter {
    /// 创建新的替换服务
    pub fn new(renderer: Arc<dyn MathRenderer>) -> Self {
        Self { renderer }
    }

    /// 替换文本中的所有公式
    ///
    /// # 参数
    /// - `input`: 原始文本
    ///
    /// # 返回
    /// 返回替换后的文本；替换流程本身出错时返回原文
    pub async fn process_string(&self, input: &str) -> String {
        match self.try_process(input).await {
            Ok(output) => output,
            Err(e) => {
                error!("公式替换失败，返回原文: {}", e);
                input.to_string()
            }
        }
    }

    async fn try_process(&self, input: &str) -> Result<String, ConvertError> {
        let mut result = input.to_string();
        for delimiter in Delimiter::ALL {
            result = self.replace_pass(&result, delimiter).await?;
        }
        Ok(result)
    }

    /// 单次扫描：先找出全部匹配，再并发渲染，最后按顺序拼接
    async fn replace_pass(&self, text: &str, delimiter: Delimiter) -> Result<String, ConvertError> {
        let fragments = find_fragments(text, delimiter);
        if fragments.is_empty() {
            return Ok(text.to_string());
        }

        debug!("{:?}: 找到 {} 个公式", delimiter, fragments.len());

        let mut tasks = JoinSet::new();
        for (index, fragment) in fragments.iter().enumerate() {
            let renderer = Arc::clone(&self.renderer);
            let latex = fragment.latex.clone();
            tasks.spawn(async move { (index, render_inline(renderer.as_ref(), &latex).await) });
        }

        // 任一任务异常时提前返回，JoinSet 被丢弃，其余渲染任务随之取消
        let mut rendered: Vec<Option<String>> = vec![None; fragments.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, svg) = joined?;
            rendered[index] = svg;
        }

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for (fragment, svg) in fragments.iter().zip(rendered) {
            output.push_str(&text[last..fragment.span.start]);
            match svg {
                Some(svg) => output.push_str(&svg),
                None => output.push_str(&text[fragment.span.clone()]),
            }
            last = fragment.span.end;
        }
        output.push_str(&text[last..]);

        Ok(output)
    }
}

fn find_fragments(text: &str, delimiter: Delimiter) -> Vec<Fragment> {
    delimiter
        .pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let latex = caps.get(1).map_or("", |m| m.as_str());
            Some(Fragment {
                span: whole.range(),
                latex: latex.to_string(),
            })
        })
        .collect()
}

/// 渲染单个公式，失败时返回 `None`
async fn render_inline(renderer: &dyn MathRenderer, latex: &str) -> Option<String> {
    match renderer.render(latex, InputFormat::Tex).await {
        Ok(svg) if !svg.is_empty() => Some(inline_svg(&svg)),
        Ok(_) => {
            error!("公式渲染结果为空: {}", latex);
            None
        }
        Err(e) => {
            error!("公式渲染失败 ({}): {}", latex, e);
            None
        }
    }
}

/// 让 SVG 以行内方式显示并与文字垂直居中
pub fn inline_svg(svg: &str) -> String {
    if svg.contains("style=\"") {
        svg.replacen("style=\"", &format!("style=\"{} ", INLINE_STYLE), 1)
    } else {
        svg.replacen("<svg", &format!("<svg style=\"{}\"", INLINE_STYLE), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Barrier;

    /// 把 LaTeX 编码成十六进制放进 SVG，输出中不会出现任何分隔符
    struct HexRenderer;

    fn hex(latex: &str) -> String {
        latex.bytes().map(|b| format!("{:02x}", b)).collect()
    }

    fn rendered(latex: &str) -> String {
        inline_svg(&format!("<svg data-tex=\"{}\"></svg>", hex(latex)))
    }

    #[async_trait]
    impl MathRenderer for HexRenderer {
        async fn render(&self, latex: &str, _format: InputFormat) -> Result<String, RenderError> {
            if latex == "bad" {
                return Err(RenderError::Tex(vec!["Undefined control sequence".to_string()]));
            }
            if latex == "blank" {
                return Ok(String::new());
            }
            if latex == "boom" {
                panic!("renderer crashed");
            }
            Ok(format!("<svg data-tex=\"{}\"></svg>", hex(latex)))
        }
    }

    fn converter() -> LatexConverter {
        LatexConverter::new(Arc::new(HexRenderer))
    }

    #[tokio::test]
    async fn text_without_delimiters_is_unchanged() {
        let input = "No math here, just (parens) and [brackets] and 5 dollars";
        assert_eq!(converter().process_string(input).await, input);
    }

    #[tokio::test]
    async fn each_delimiter_alone_is_replaced() {
        let cases = [
            ("Solve \\(x^2=4\\) now", "x^2=4"),
            ("Solve \\[x^2=4\\] now", "x^2=4"),
            ("Solve $$x^2=4$$ now", "x^2=4"),
            ("Solve $x^2=4$ now", "x^2=4"),
        ];

        for (input, latex) in cases {
            let expected = format!("Solve {} now", rendered(latex));
            assert_eq!(converter().process_string(input).await, expected, "{}", input);
        }
    }

    #[tokio::test]
    async fn all_four_delimiters_in_one_text() {
        let input = "a \\(p\\) b \\[q\\] c $$r$$ d $s$ e";
        let expected = format!(
            "a {} b {} c {} d {} e",
            rendered("p"),
            rendered("q"),
            rendered("r"),
            rendered("s")
        );
        assert_eq!(converter().process_string(input).await, expected);
    }

    #[tokio::test]
    async fn multiple_fragments_keep_their_order() {
        let input = "$a$ and $b$ and $c$";
        let expected = format!("{} and {} and {}", rendered("a"), rendered("b"), rendered("c"));
        assert_eq!(converter().process_string(input).await, expected);
    }

    #[tokio::test]
    async fn empty_fragment_is_rendered() {
        let output = converter().process_string("x \\(\\) y").await;
        assert_eq!(output, format!("x {} y", rendered("")));
    }

    #[tokio::test]
    async fn failed_fragment_is_kept_verbatim() {
        let input = "ok $a$ then \\(bad\\) then \\[blank\\]";
        let expected = format!("ok {} then \\(bad\\) then \\[blank\\]", rendered("a"));
        assert_eq!(converter().process_string(input).await, expected);
    }

    #[tokio::test]
    async fn earlier_pass_consumes_inner_delimiters() {
        // `\( ... \)` 先处理，内部的 `$` 不会再被单独匹配
        let input = "\\($x$\\) and $y$";
        let expected = format!("{} and {}", rendered("$x$"), rendered("y"));
        assert_eq!(converter().process_string(input).await, expected);
    }

    #[tokio::test]
    async fn double_dollar_wins_over_single_dollar() {
        let input = "$$a$$ $b$";
        let expected = format!("{} {}", rendered("a"), rendered("b"));
        assert_eq!(converter().process_string(input).await, expected);
    }

    #[tokio::test]
    async fn fragments_do_not_cross_lines() {
        for input in ["$a\nb$", "$a\rb$", "$a\u{2028}b$", "\\(a\u{2029}b\\)"] {
            assert_eq!(converter().process_string(input).await, input, "{:?}", input);
        }
    }

    #[tokio::test]
    async fn unmatched_delimiter_is_left_alone() {
        let input = "costs $5 only";
        assert_eq!(converter().process_string(input).await, input);
    }

    #[tokio::test]
    async fn crashed_render_task_returns_original_text() {
        let input = "\\(a\\) then $boom$";
        assert_eq!(converter().process_string(input).await, input);
    }

    #[tokio::test]
    async fn rendered_output_is_not_rescanned() {
        let output = converter().process_string("\\(x\\) $y$").await;
        for delimiter in Delimiter::ALL {
            let again = find_fragments(&output, delimiter);
            assert!(again.is_empty(), "{:?} matched rendered output", delimiter);
        }
    }

    #[test]
    fn inline_style_is_added_to_bare_svg() {
        assert_eq!(
            inline_svg("<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>"),
            "<svg style=\"display: inline; vertical-align: middle;\" xmlns=\"http://www.w3.org/2000/svg\"></svg>"
        );
    }

    #[test]
    fn inline_style_is_prepended_to_existing_style() {
        assert_eq!(
            inline_svg("<svg width=\"2ex\" style=\"vertical-align: -0.338ex;\"></svg>"),
            "<svg width=\"2ex\" style=\"display: inline; vertical-align: middle; vertical-align: -0.338ex;\"></svg>"
        );
    }

    #[test]
    fn find_fragments_is_non_greedy() {
        let fragments = find_fragments("$a$ b $c$", Delimiter::InlineDollar);
        let latex: Vec<&str> = fragments.iter().map(|f| f.latex.as_str()).collect();
        assert_eq!(latex, vec!["a", "c"]);
        assert_eq!(fragments[0].span, 0..3);
    }

    /// 第一个公式渲染得最慢
    struct SlowFirstRenderer;

    #[async_trait]
    impl MathRenderer for SlowFirstRenderer {
        async fn render(&self, latex: &str, _format: InputFormat) -> Result<String, RenderError> {
            if latex == "a" {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(format!("<svg data-tex=\"{}\"></svg>", hex(latex)))
        }
    }

    #[tokio::test]
    async fn out_of_order_completion_keeps_source_order() {
        let converter = LatexConverter::new(Arc::new(SlowFirstRenderer));
        let output = converter.process_string("$a$ $b$ $c$").await;
        assert_eq!(
            output,
            format!("{} {} {}", rendered("a"), rendered("b"), rendered("c"))
        );
    }

    /// 所有渲染调用同时到达屏障后才返回
    struct BarrierRenderer {
        barrier: Barrier,
    }

    #[async_trait]
    impl MathRenderer for BarrierRenderer {
        async fn render(&self, latex: &str, _format: InputFormat) -> Result<String, RenderError> {
            self.barrier.wait().await;
            Ok(format!("<svg data-tex=\"{}\"></svg>", hex(latex)))
        }
    }

    #[tokio::test]
    async fn fragments_in_one_pass_render_concurrently() {
        let converter = LatexConverter::new(Arc::new(BarrierRenderer {
            barrier: Barrier::new(3),
        }));

        let output = tokio::time::timeout(
            Duration::from_secs(5),
            converter.process_string("$a$ $b$ $c$"),
        )
        .await
        .expect("渲染调用没有并发执行");

        assert_eq!(
            output,
            format!("{} {} {}", rendered("a"), rendered("b"), rendered("c"))
        );
    }

    /// `boom` 立即崩溃，其余公式慢速完成并计数
    struct CountingRenderer {
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MathRenderer for CountingRenderer {
        async fn render(&self, latex: &str, _format: InputFormat) -> Result<String, RenderError> {
            if latex == "boom" {
                panic!("renderer crashed");
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(format!("<svg data-tex=\"{}\"></svg>", hex(latex)))
        }
    }

    #[tokio::test]
    async fn crashed_pass_cancels_remaining_renders() {
        let finished = Arc::new(AtomicUsize::new(0));
        let converter = LatexConverter::new(Arc::new(CountingRenderer {
            finished: Arc::clone(&finished),
        }));

        let input = "$slow$ $boom$ $late$";
        assert_eq!(converter.process_string(input).await, input);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
