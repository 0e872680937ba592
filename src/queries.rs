use crate::domain::TitleVariant;

/// Search phrasings tried in order for every title variant. Multiple
/// languages widen the net for scores hosted on non-English sites.
const TEMPLATES: &[&str] = &[
    // English
    "{title} {composer} sheet music pdf",
    "{title} {composer} piano sheet music",
    "{title} {composer} piano sheet music pdf",
    "{title} {composer} score pdf download",
    "{title} {composer} full score pdf",
    "{title} {composer} piano score pdf",
    "{title} {composer} pdf",
    "{title} {composer} piano solo pdf",
    "{title} {composer} piano pdf",
    "{title} pdf sheet music",
    // Spanish
    "{title} {composer} partituras pdf download",
    "{title} {composer} partituras pdf",
    "{title} {composer} partituras piano pdf",
    "{title} {composer} partitura piano pdf",
    // French
    "{title} {composer} partition pdf",
    "{title} {composer} partition piano pdf",
    "{title} {composer} partition piano",
    // Italian
    "{title} {composer} spartito pdf",
    "{title} {composer} spartito pianoforte pdf",
    // Portuguese
    "{title} {composer} partitura pdf",
    // German
    "{title} {composer} notenblätter pdf",
    "{title} {composer} notenblatt pdf",
    "{title} {composer} piano notenblätter pdf",
    // Russian
    "{title} {composer} ноты pdf",
    "{title} {composer} ноты пианино pdf",
    // Chinese
    "{title} {composer} 乐谱 pdf",
    "{title} {composer} 钢琴 乐谱 pdf",
    // Japanese
    "{title} {composer} 楽譜 pdf",
    "{title} {composer} ピアノ 楽譜 pdf",
    // Arabic
    "{title} {composer} نوتة موسيقية pdf",
];

/// Expands the fixed template list for one title variant. Pure and
/// deterministic: same inputs, same queries, same order.
pub fn generate(variant: &TitleVariant, composer: &str) -> Vec<String> {
    let title = variant.text();
    TEMPLATES
        .iter()
        .map(|template| {
            template
                .replace("{title}", &title)
                .replace("{composer}", composer)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_title_and_composer_into_every_template() {
        let variant = TitleVariant::full("Minuet in G");
        let queries = generate(&variant, "J.S. Bach");
        assert_eq!(queries.len(), TEMPLATES.len());
        assert_eq!(queries[0], "Minuet in G J.S. Bach sheet music pdf");
        assert!(queries.iter().all(|q| q.contains("Minuet in G")));
    }

    #[test]
    fn generation_is_deterministic() {
        let variant = TitleVariant::full("Für Elise");
        let first = generate(&variant, "Beethoven");
        let second = generate(&variant, "Beethoven");
        assert_eq!(first, second);
    }

    #[test]
    fn narrowed_variant_changes_queries_only_through_title() {
        let full = TitleVariant::full("Minuet in G");
        let narrowed = full.narrowed().unwrap();
        let queries = generate(&narrowed, "J.S. Bach");
        assert_eq!(queries[0], "Minuet in J.S. Bach sheet music pdf");
    }
}
