//! Prompt templates for the text models.

use shotline_models::{GenerationContext, PromptMode, ScriptAnalysis};

/// Prompt for a deep script analysis.
pub fn analysis_prompt(script: &str) -> String {
    format!(
        r#"You are a film director preparing a short video. Analyze the script below.

Return ONLY a single JSON object with this schema:
{{
  "pacing": "overall pacing and rhythm",
  "tone": "emotional tone",
  "characters": ["name: short visual description"],
  "break_points": ["script line where a cut feels natural"],
  "summary": "one-paragraph summary"
}}

SCRIPT:
{script}
"#
    )
}

/// Prompt for splitting a script into duration-bounded segments.
pub fn split_prompt(script: &str, shot_duration_secs: u32, max_segments: usize) -> String {
    format!(
        r#"Split the script below into consecutive segments for a continuous video edit.
Each segment will become one {shot_duration_secs}-second shot.

Rules:
- Return at most {max_segments} segments.
- Keep the original wording and order; do not summarize.
- Every part of the script must appear in exactly one segment.

Return ONLY a JSON object: {{"segments": ["segment text", ...]}}

SCRIPT:
{script}
"#
    )
}

/// Prompt for storyboard mode: the whole script in one request.
pub fn storyboard_prompt(
    script: &str,
    context: &GenerationContext,
    analysis: Option<&ScriptAnalysis>,
) -> String {
    let analysis = analysis
        .map(|a| format!("\nDEEP ANALYSIS:\n{}", a.to_context()))
        .unwrap_or_default();
    format!(
        r#"You are a storyboard artist. Break the script below into shots and write prompts for each.

{context}
Aspect ratio: {aspect}. Target shot length: {duration} seconds.{reference}
{analysis}
For every shot return:
- "segment": the exact script text the shot covers
- "video_prompt": a full-motion prompt (camera movement, action, lighting)
- "image_prompt": a still first-frame prompt (composition, subject, lighting)

Return ONLY a JSON object: {{"shots": [{{"segment": "...", "video_prompt": "...", "image_prompt": "..."}}]}}

SCRIPT:
{script}
"#,
        context = context.style_summary(),
        aspect = context.aspect_ratio,
        duration = context.shot_duration_secs,
        reference = reference_note(context),
    )
}

/// Prompt for continuous mode: one entry per reviewed segment.
pub fn batch_prompt(segments: &[String], context: &GenerationContext) -> String {
    let numbered = segments
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"You are a storyboard artist writing prompts for a continuous edit where each shot
starts from the last frame of the previous one.

{context}
Aspect ratio: {aspect}. Shot length: {duration} seconds.{reference}

Write prompts for EXACTLY {count} shots, one per numbered segment, in the same order.
For every segment return:
- "segment": the segment text, unchanged
- "video_prompt": a full-motion prompt that flows from the previous shot
- "image_prompt": a still first-frame prompt

Return ONLY a JSON object: {{"shots": [{{"segment": "...", "video_prompt": "...", "image_prompt": "..."}}]}}

SEGMENTS:
{numbered}
"#,
        context = context.style_summary(),
        aspect = context.aspect_ratio,
        duration = context.shot_duration_secs,
        reference = reference_note(context),
        count = segments.len(),
    )
}

/// Prompt asking for a first-frame image prompt.
pub fn first_frame_prompt(segment: &str, context: &GenerationContext) -> String {
    format!(
        r#"Write one prompt for an image generator describing the opening still frame of this shot.
Describe subject, composition, lighting and lens. No camera movement.

{context}
Aspect ratio: {aspect}.{reference}

SHOT:
{segment}

Reply with the prompt text only."#,
        context = context.style_summary(),
        aspect = context.aspect_ratio,
        reference = reference_note(context),
    )
}

/// Templated first-frame prompt used when the text model is unavailable.
pub fn default_first_frame_prompt(segment: &str, context: &GenerationContext) -> String {
    let mut prompt = format!(
        "Opening still frame, {} style, {} composition: {}",
        context.style,
        context.aspect_ratio,
        segment.trim()
    );
    if !context.era.trim().is_empty() {
        prompt.push_str(&format!(". Set in {}", context.era.trim()));
    }
    if !context.ethnicity.trim().is_empty() {
        prompt.push_str(&format!(". {} characters", context.ethnicity.trim()));
    }
    prompt.push_str(". Cinematic lighting, high detail.");
    prompt
}

/// Prompt asking to rewrite an existing prompt.
pub fn refine_prompt(
    prompt: &str,
    instruction: &str,
    mode: PromptMode,
    context: &GenerationContext,
) -> String {
    let target = match mode {
        PromptMode::Image => "a still image generator (no motion)",
        PromptMode::Video => "a video generator (include motion and camera movement)",
    };
    format!(
        r#"Rewrite the prompt below for {target} following the instruction.
{context}

PROMPT:
{prompt}

INSTRUCTION:
{instruction}

Reply with the rewritten prompt text only."#,
        context = context.style_summary(),
    )
}

/// Video prompt with style and era reinforcement appended.
pub fn reinforced_video_prompt(prompt: &str, context: &GenerationContext) -> String {
    format!("{}\n\n{}.", prompt.trim(), context.style_summary())
}

fn reference_note(context: &GenerationContext) -> &'static str {
    if context.reference_image.is_some() {
        "\nKeep characters and look consistent with the attached reference image."
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotline_models::{AspectRatio, ImageAsset};

    fn context() -> GenerationContext {
        GenerationContext {
            style: "noir".to_string(),
            era: "1940s".to_string(),
            ethnicity: String::new(),
            aspect_ratio: AspectRatio::PORTRAIT,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_first_frame_prompt_uses_context() {
        let prompt = default_first_frame_prompt("  A detective lights a match. ", &context());
        assert!(prompt.contains("noir style"));
        assert!(prompt.contains("9:16"));
        assert!(prompt.contains("A detective lights a match."));
        assert!(prompt.contains("Set in 1940s"));
        assert!(!prompt.contains("characters"));
    }

    #[test]
    fn test_batch_prompt_numbers_segments() {
        let segments = vec!["first".to_string(), "second".to_string()];
        let prompt = batch_prompt(&segments, &context());
        assert!(prompt.contains("EXACTLY 2 shots"));
        assert!(prompt.contains("1. first\n2. second"));
    }

    #[test]
    fn test_reference_note_only_with_reference() {
        let mut ctx = context();
        assert!(!first_frame_prompt("x", &ctx).contains("reference image"));
        ctx.reference_image = Some(ImageAsset::new(vec![1], "image/jpeg"));
        assert!(first_frame_prompt("x", &ctx).contains("reference image"));
    }

    #[test]
    fn test_storyboard_prompt_includes_analysis() {
        let analysis = ScriptAnalysis {
            tone: "tense".to_string(),
            ..Default::default()
        };
        let prompt = storyboard_prompt("script", &context(), Some(&analysis));
        assert!(prompt.contains("Tone: tense"));
        assert!(!storyboard_prompt("script", &context(), None).contains("DEEP ANALYSIS"));
    }

    #[test]
    fn test_reinforced_video_prompt() {
        let prompt = reinforced_video_prompt("Slow push in.", &context());
        assert!(prompt.starts_with("Slow push in."));
        assert!(prompt.contains("Style: noir. Era: 1940s"));
    }
}
