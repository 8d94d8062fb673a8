// Prompt text sent to the vision and language models.

pub const ANALYZE_QUESTION: &str = "write a description of what you see. Point out exactly three things in one word. I only want JSON output. Don't add any newlines make it as compact as possible. Make it an array ```ts type result:string[] = [\"item 1\", \"item 2\", \"item 3\"] ```";

pub const EXTRACT_JSON_SYSTEM: &str = "Extract exactly three items from the provided text describing what is observed in an image. Return them as an array of three strings.";

pub const CLEAN_TERMS_SYSTEM: &str = r#"You clean up terms for Wikipedia lookup. Rules:
- Convert plural to singular (e.g., "curtains" -> "curtain")
- Reduce multi-word phrases to the single most relevant word for Wikipedia (e.g., "pink wall" -> "wall" or "pink", whichever makes more sense)
- Keep proper nouns as-is
- Return ONLY a JSON object of the form {"items": [...]} with the cleaned terms, no explanations
- Maintain the same order as input"#;

pub const SUMMARIZE_SYSTEM: &str = "You are a helpful assistant that extracts key facts from Wikipedia articles. Summarize 5 most important sections of each of the articles into exactly one short, clear sentences that capture the most important information. Be concise and informative. Then create a new Wikipedia article based on the content. Keep it short as the goal is to provide a quick overview. Return ONLY the summary text without any additional commentary.";

pub const SUMMARIZE_STREAM_SYSTEM: &str = "You are a helpful assistant that extracts key facts from Wikipedia articles. Summarize 3 most important sections of the article into exactly one short, clear sentence each that captures the most important information. Be concise and informative. Then create a new Wikipedia article based on the content. Keep it short as the goal is to provide a quick overview. Return ONLY the summary text without any additional commentary.";

pub const VISUALIZATION_SYSTEM: &str = r#"You are an expert in expressive web typography and creative web design!

Requirements:
- Create a complete HTML document with DOCTYPE, head, and body
- Don't just use the text come up with a new creative content based on the summaries
- Include all CSS inline in a <style> tag - no external stylesheets
- Use creative spatial typography - vary font sizes, positions, rotations, and layouts
- You are specialized in generative typographic art.
- Use only one font but vary weights and sizes.
- Use absolute positioning for layout.
- No images or illustrations, only text-based design.
- Focus on experimental and artistic layouts.
- Avoid traditional article structures.
- Create unique, artistic HTML pages with experimental spatial layouts.
- No need to use all the text.
- Simplify and abstract the information to create a visual experience.
- Try do work on depth.

- Use reduced colors and high contrast. White background and expressive colors.
- Use the text to create a mixture of the information instead of just making it look like an article.
- NO ROUNDED CORNERS.
- VERY IMPORTANT! You always return complete, valid HTML documents.
- No illustration.
"#;

pub const VISUALIZATION_STREAM_SYSTEM: &str = r#"You are an expert in expressive web typography and creative web design that has internalized the laws of gestalt and color theory!

Remember Gestalt works are better when you consider:
- Proximity
- Similarity
- Continuity
- Closure
- Figure/Ground
- Symmetry & Order

Remember Colors are better when you consider:
- Contrast
- Saturation
- Hue
- Temperature
- Monochromatic vs Complementary
- Triadic
- Analogous
- Tetradic
- Split-Complementary
- Color Harmony

Requirements:
- Create a complete HTML document with DOCTYPE, head, and body
- Don't just use the text come up with a new creative content based on the summaries
- Include all CSS inline in a <style> tag - no external stylesheets
- Use creative spatial typography - vary font sizes, positions, rotations, and layouts
- You are specialized in generative typographic art.
- Use only one font but vary weights and sizes.
- Use absolute positioning for layout.
- NO images or illustrations, only text-based design.
- NO need to use all the text.
- Focus on experimental and artistic layouts.
- Avoid traditional article structures.
- Create unique, artistic HTML pages with experimental spatial layouts.
- Simplify and abstract the information to create a visual experience.
- Try do work on depth.

- White background and expressive colors. High contrast.
- Use the text to create a mixture of the information instead of just making it look like an article.
- NO ROUNDED CORNERS.
- VERY IMPORTANT! You always return complete, valid HTML documents.
- No illustration.
- CRITICAL: Return ONLY the raw HTML, no markdown code fences, no ```html wrapper, just the HTML starting with <!DOCTYPE html>
"#;

pub fn observations_schema() -> serde_json::Value {
    serde_json::json!({
        "name": "image_observations",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 3,
                    "maxItems": 3,
                    "description": "Exactly three observations from the image"
                }
            },
            "required": ["items"],
            "additionalProperties": false
        }
    })
}

pub fn article_prompt(title: &str, text: &str) -> String {
    format!("Article title: {title}\n\nArticle text:\n{text}")
}

pub fn summaries_prompt<'a>(summaries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    summaries
        .into_iter()
        .map(|(title, summary)| format!("Title: {title}\nSummary: {summary}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
