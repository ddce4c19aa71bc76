//! Prompt texts for the rewrite, review, cover and style extraction steps.

use crate::render_template;
use scrivener_core::Snippet;

/// Literal used in the rewrite prompt when retrieval found nothing.
pub const NO_MATERIALS: &str = "（无相关素材）";

pub(crate) const REWRITE_SYSTEM: &str = "你是一名资深的中文文章改写编辑。\n\
1. 保留原文的核心观点和事实，用指定的写作风格重新表达\n\
2. 只输出改写后的正文，不要解释，不要输出思考过程\n\
3. 不要输出任何 XML 或 HTML 标签\n\
4. 不要在开头或结尾附加说明文字";

const REWRITE_TEMPLATE: &str = "请按照下面的写作风格改写原文，让成稿读起来像真人写的，而不是机器生成的。

## 写作风格
{style}

## 篇幅
目标约 {target} 字，必须落在 {min}-{max} 字之间。

## 原文
{source}

## 参考素材（可选用）
{materials}

## 写作要求
- 开头直接进入场景、问题或观点，不要用“在当今社会”“随着……的发展”“众所周知”之类的套话
- 段落之间自然衔接，不要用“首先、其次、最后”“第一点、第二点”排列观点
- 结尾可以留白、反问或呼应开头，不要用“总而言之”“综上所述”“让我们共同期待”
- 少用“此外”“与此同时”“至关重要”“彰显”“赋能”等高频套词
- 句子长短交错，允许口语化的停顿和个人判断
- 具体胜过抽象：多写细节、数字和画面，少写空泛的总结

## 配图位置
在正文中合适的段落之后单独成行插入 2-4 个配图建议，格式严格如下：
[配图建议|名称:一句话命名|说明:适合配图的画面描述]

请直接输出改写后的文章：";

pub(crate) const REVIEW_SYSTEM: &str = r#"你是一名严格的主编，负责在发布前审核改写稿。

请从两方面审核：
1. AI 痕迹：是否有模板化开头、机械的过渡词、空洞的总结、堆砌的高频词
2. 质量评分（每项 0-10 分）：
   - directness 直接性：是否开门见山、不绕弯
   - rhythm 节奏：句式是否长短有变化
   - trust 可信度：是否有具体细节支撑观点
   - authenticity 真实感：是否像真人写作
   - conciseness 简洁度：是否没有废话

总分低于 35 分必须判定为不通过。

只输出一个 JSON 对象，不要输出其他内容，结构如下：
{
  "ai_detection": {"has_ai_smell": false, "issues": [], "examples": []},
  "quality_scores": {"directness": 0, "rhythm": 0, "trust": 0, "authenticity": 0, "conciseness": 0, "total": 0},
  "issues": [{"type": "", "severity": "high|medium|low", "location": "", "description": "", "suggestion": ""}],
  "passed": true,
  "reason": ""
}"#;

const REVIEW_TEMPLATE: &str =
    "请审核下面这篇文章。\n\n## 写作风格要求\n{style}\n\n## 待审核文章\n{content}\n\n请输出审核结果（JSON）：";

pub(crate) const KEYWORD_TEMPLATE: &str = "从下面的文章中提炼 3-5 个最核心的主题关键词，只输出关键词，用逗号分隔。\n\n{content}";

pub(crate) const IMAGE_PROMPT_SYSTEM: &str = "You write prompts for a text-to-image model. \
Reply with a single English paragraph describing one concrete scene: subject, composition, \
art style, color palette and mood, followed by quality modifiers. \
Do not include any text, captions, logos or watermarks in the scene. No preamble.";

pub(crate) const IMAGE_PROMPT_TEMPLATE: &str = "Write an image prompt for an article cover.\n\
Keywords: {keywords}\n\
Article title: {title}";

pub(crate) const STYLE_SYSTEM: &str = "你是一个专业的写作风格建模专家。\
请严格按照JSON格式输出12个维度的分析结果，不要添加其他内容。确保所有JSON字段都是有效的。";

const STYLE_EXTRACTION_INSTRUCTIONS: &str = r#"请对下面的参考文章做风格建模，提取一份“写作配方”：拿着这份配方，任何人都能写出相似的文章。不要写评论，要写可执行的规律。

请从以下 12 个维度分析：
1. persona 核心人格与立场：作者在读者面前的角色、对读者的态度、价值观倾向、情绪基调
2. thinking_pattern 思维模式：典型论证结构、是否常推翻读者预期、常用的跨领域类比
3. opening_pattern 开头模式：开头句式、第一段长度、切入快慢，是否避开套话开头
4. transition_pattern 过渡模式：段落如何衔接，是否用“首先/其次”，典型的话题切换词
5. sentence_rhythm 句式与节奏：长短句比例、标点习惯、段落长短分布
6. vocabulary 词汇指纹：高频特色词、口头禅、从不出现的词、粗俗程度
7. rhetorical_devices 修辞手法：反问、排比、比喻、夸张的使用方式和频率
8. ending_pattern 结尾模式：结尾句式、最后一段长度、是否有空泛升华
9. format_layout 格式排版：小标题、加粗、列表的使用习惯
10. signature_moves 招牌动作：3-5 个最有辨识度的习惯
11. anti_ai_features 反AI特征：哪些刻意的不规则让读者确信这不是机器写的
12. paragraph_templates 段落模板：观点段、举例段、转折段、收尾段各一个

只输出一个 JSON 对象，所有字段必填，没有则写“无”：
{
  "persona": "",
  "thinking_pattern": "",
  "opening_pattern": "",
  "transition_pattern": "",
  "sentence_rhythm": "",
  "vocabulary": "",
  "rhetorical_devices": "",
  "ending_pattern": "",
  "format_layout": "",
  "signature_moves": ["", "", ""],
  "anti_ai_features": "",
  "paragraph_templates": {"观点段": "", "举例段": "", "转折段": "", "收尾段": ""},
  "overall_summary": "总体风格概括（100字以内）"
}"#;

/// Query sent to retrieval: the first 500 characters of the source.
pub fn rag_query(source: &str) -> String {
    source.chars().take(500).collect()
}

/// Retrieved snippets as numbered material blocks.
///
/// ```
/// use scrivener_core::Snippet;
/// use scrivener_workflow::render_materials;
///
/// assert_eq!(render_materials(&[]), "（无相关素材）");
/// let text = render_materials(&[Snippet::new("甲", 0.9), Snippet::new("乙", 0.5)]);
/// assert_eq!(text, "素材1：甲\n\n素材2：乙");
/// ```
pub fn render_materials(snippets: &[Snippet]) -> String {
    if snippets.is_empty() {
        return NO_MATERIALS.to_string();
    }
    snippets
        .iter()
        .enumerate()
        .map(|(i, snippet)| format!("素材{}：{}", i + 1, snippet.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Lower and upper word bounds, 80% and 120% of the target.
pub fn word_bounds(target_words: u32) -> (u32, u32) {
    let target = u64::from(target_words);
    ((target * 8 / 10) as u32, (target * 12 / 10) as u32)
}

/// User prompt for one rewrite attempt.
pub fn rewrite_prompt(
    style_description: &str,
    target_words: u32,
    source: &str,
    snippets: &[Snippet],
) -> String {
    let (min, max) = word_bounds(target_words);
    let target = target_words.to_string();
    let min = min.to_string();
    let max = max.to_string();
    let materials = render_materials(snippets);
    render_template(
        REWRITE_TEMPLATE,
        &[
            ("style", style_description),
            ("target", &target),
            ("min", &min),
            ("max", &max),
            ("source", source),
            ("materials", &materials),
        ],
    )
}

/// User prompt for one review.
pub fn review_prompt(style_summary: &str, content: &str) -> String {
    render_template(
        REVIEW_TEMPLATE,
        &[("style", style_summary), ("content", content)],
    )
}

/// User prompt for style extraction over already-combined articles.
///
/// The JSON skeleton contains literal braces, so the articles are appended
/// rather than substituted.
pub fn style_prompt(articles: &str) -> String {
    format!("{STYLE_EXTRACTION_INSTRUCTIONS}\n\n参考文章：\n{articles}")
}
