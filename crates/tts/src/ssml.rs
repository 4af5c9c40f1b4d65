use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A structural tag family that survives escaping untouched
struct PreservedTag {
    name: &'static str,
    pattern: Regex,
}

/// Ordered whitelist of caller-authored markup that must not be escaped
static PRESERVED_TAGS: LazyLock<Vec<PreservedTag>> = LazyLock::new(|| {
    let tag = |name: &'static str, pattern: &str| PreservedTag {
        name,
        pattern: Regex::new(pattern).expect("preserved tag pattern is valid"),
    };
    vec![
        tag("break", r"<break\s+[^>]*/>"),
        tag("speak", r"<speak>|</speak>"),
        tag("prosody", r"<prosody\s+[^>]*>|</prosody>"),
        tag("emphasis", r"<emphasis\s+[^>]*>|</emphasis>"),
        tag("voice", r"<voice\s+[^>]*>|</voice>"),
        tag("say-as", r"<say-as\s+[^>]*>|</say-as>"),
        tag("phoneme", r"<phoneme\s+[^>]*>|</phoneme>"),
        tag("audio", r"<audio\s+[^>]*>|</audio>"),
        tag("p", r"<p>|</p>"),
        tag("s", r"<s>|</s>"),
        tag("sub", r"<sub\s+[^>]*>|</sub>"),
        tag("mstts", r"<mstts:[^>]*>|</mstts:[^>]*>"),
    ]
});

/// Build the SSML document for one synthesis request
///
/// Caller-authored structural tags in `text` survive verbatim; all other
/// angle-bracket content is entity-escaped. Rate and pitch are signed
/// percentage deltas. Pure function of its inputs.
pub fn build(text: &str, voice: &str, rate: i32, pitch: i32, style: &str) -> String {
    let escaped = escape_preserving_tags(text);
    format!(
        concat!(
            "<speak xmlns=\"http://www.w3.org/2001/10/synthesis\" ",
            "xmlns:mstts=\"http://www.w3.org/2001/mstts\" version=\"1.0\" xml:lang=\"zh-CN\"> ",
            "<voice name=\"{voice}\"> ",
            "<mstts:express-as style=\"{style}\" styledegree=\"1.0\" role=\"default\"> ",
            "<prosody rate=\"{rate}%\" pitch=\"{pitch}%\" volume=\"50\">{text}</prosody> ",
            "</mstts:express-as> </voice> </speak>",
        ),
        voice = voice,
        style = style,
        rate = rate,
        pitch = pitch,
        text = escaped,
    )
}

/// Escape XML specials while keeping whitelisted tags byte-identical
///
/// Two passes: each whitelisted match is swapped for a placeholder token
/// before escaping and restored afterwards. Tokens carry the tag name and
/// a per-call counter so they stay unique within one invocation.
fn escape_preserving_tags(input: &str) -> String {
    let mut counter = 0usize;
    let mut placeholders: Vec<(String, String)> = Vec::new();
    let mut working = input.to_string();

    for tag in PRESERVED_TAGS.iter() {
        working = tag
            .pattern
            .replace_all(&working, |caps: &Captures<'_>| {
                let token = format!("__SSML_PLACEHOLDER_{}_{}__", tag.name, counter);
                counter += 1;
                placeholders.push((token.clone(), caps[0].to_string()));
                token
            })
            .into_owned();
    }

    let mut escaped = escape_xml(&working);
    for (token, original) in placeholders {
        escaped = escaped.replacen(&token, &original, 1);
    }

    escaped
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Extract the prosody body from a built document
    ///
    /// The end boundary is the envelope's own closing tag, which is always
    /// the last one — preserved caller tags may close prosody earlier.
    fn inner_text(document: &str) -> &str {
        let start = document.find("volume=\"50\">").expect("prosody open tag") + "volume=\"50\">".len();
        let end = document.rfind("</prosody>").expect("prosody close tag");
        &document[start..end]
    }

    #[test]
    fn whitelisted_tags_survive_byte_for_byte() {
        let input = r#"<speak><prosody rate="5%">hello</prosody><break time="200ms"/></speak>"#;
        let document = build(input, "en-US-AriaNeural", 0, 0, "general");
        assert_eq!(inner_text(&document), input);
    }

    #[test]
    fn plain_specials_are_entity_escaped() {
        let document = build("a<b>&'\"c", "v", 0, 0, "general");
        assert_eq!(inner_text(&document), "a&lt;b&gt;&amp;&apos;&quot;c");
    }

    #[test]
    fn non_whitelisted_tags_are_escaped() {
        let document = build("<script>alert(1)</script>", "v", 0, 0, "general");
        assert_eq!(inner_text(&document), "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn mixed_content_preserves_tags_and_escapes_the_rest() {
        let input = r#"tom & jerry <break time="1s"/> <b>bold</b>"#;
        let document = build(input, "v", 0, 0, "general");
        assert_eq!(
            inner_text(&document),
            r#"tom &amp; jerry <break time="1s"/> &lt;b&gt;bold&lt;/b&gt;"#
        );
    }

    #[test]
    fn repeated_tags_get_distinct_placeholders() {
        let input = r#"<break time="1s"/>x<break time="2s"/>"#;
        let document = build(input, "v", 0, 0, "general");
        assert_eq!(inner_text(&document), input);
    }

    #[test]
    fn namespaced_tag_family_is_preserved() {
        let input = r#"<mstts:express-as style="sad">low</mstts:express-as>"#;
        let document = build(input, "v", 0, 0, "general");
        assert_eq!(inner_text(&document), input);
    }

    #[test]
    fn envelope_carries_prosody_and_style() {
        let document = build("hi", "zh-CN-XiaoxiaoNeural", 10, -5, "cheerful");
        assert!(document.contains(r#"<voice name="zh-CN-XiaoxiaoNeural">"#));
        assert!(document.contains(r#"style="cheerful" styledegree="1.0" role="default""#));
        assert!(document.contains(r#"rate="10%" pitch="-5%" volume="50""#));
        assert!(document.starts_with("<speak "));
        assert!(document.ends_with("</speak>"));
    }

    #[test]
    fn empty_text_yields_empty_body() {
        let document = build("", "v", 0, 0, "general");
        assert_eq!(inner_text(&document), "");
    }
}
