use lpc::{highlights, HighlightKind, LineIndex, Parsed};
use tower_lsp::lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokens, SemanticTokensLegend,
};

use crate::backend::Backend;

impl Backend {
    pub(crate) const SEM_TOKEN_KEYWORD: u32 = 0;
    pub(crate) const SEM_TOKEN_TYPE: u32 = 1;
    pub(crate) const SEM_TOKEN_MODIFIER: u32 = 2;
    pub(crate) const SEM_TOKEN_FUNCTION: u32 = 3;
    pub(crate) const SEM_TOKEN_VARIABLE: u32 = 4;
    pub(crate) const SEM_TOKEN_PARAMETER: u32 = 5;
    pub(crate) const SEM_TOKEN_NUMBER: u32 = 6;
    pub(crate) const SEM_TOKEN_STRING: u32 = 7;
    pub(crate) const SEM_TOKEN_ENUM_MEMBER: u32 = 8;
    pub(crate) const SEM_TOKEN_COMMENT: u32 = 9;

    pub(crate) const SEM_MODIFIER_DECLARATION: u32 = 1 << 0;
    pub(crate) const SEM_MODIFIER_DOCUMENTATION: u32 = 1 << 1;

    pub(crate) fn semantic_tokens_legend() -> SemanticTokensLegend {
        SemanticTokensLegend {
            token_types: vec![
                SemanticTokenType::KEYWORD,
                SemanticTokenType::TYPE,
                SemanticTokenType::MODIFIER,
                SemanticTokenType::FUNCTION,
                SemanticTokenType::VARIABLE,
                SemanticTokenType::PARAMETER,
                SemanticTokenType::NUMBER,
                SemanticTokenType::STRING,
                SemanticTokenType::ENUM_MEMBER,
                SemanticTokenType::COMMENT,
            ],
            token_modifiers: vec![
                SemanticTokenModifier::DECLARATION,
                SemanticTokenModifier::DOCUMENTATION,
            ],
        }
    }

    fn classify_highlight(kind: HighlightKind) -> Option<(u32, u32)> {
        let classified = match kind {
            HighlightKind::Keyword => (Self::SEM_TOKEN_KEYWORD, 0),
            HighlightKind::Type => (Self::SEM_TOKEN_TYPE, 0),
            HighlightKind::Modifier => (Self::SEM_TOKEN_MODIFIER, 0),
            HighlightKind::Function => (Self::SEM_TOKEN_FUNCTION, 0),
            HighlightKind::Variable => (Self::SEM_TOKEN_VARIABLE, Self::SEM_MODIFIER_DECLARATION),
            HighlightKind::Parameter => (Self::SEM_TOKEN_PARAMETER, Self::SEM_MODIFIER_DECLARATION),
            HighlightKind::Name => (Self::SEM_TOKEN_VARIABLE, 0),
            HighlightKind::Integer | HighlightKind::Float => (Self::SEM_TOKEN_NUMBER, 0),
            HighlightKind::String | HighlightKind::Character | HighlightKind::Symbol => {
                (Self::SEM_TOKEN_STRING, 0)
            }
            HighlightKind::Constant => (Self::SEM_TOKEN_ENUM_MEMBER, 0),
            HighlightKind::Comment => (Self::SEM_TOKEN_COMMENT, 0),
            HighlightKind::DocComment => (Self::SEM_TOKEN_COMMENT, Self::SEM_MODIFIER_DOCUMENTATION),
            // Holes are reported as diagnostics.
            HighlightKind::Missing | HighlightKind::Wrong => return None,
        };
        Some(classified)
    }

    pub(crate) fn build_semantic_tokens(text: &str, parsed: &Parsed) -> SemanticTokens {
        let index = LineIndex::new(text);
        let mut data = Vec::new();
        let mut last_line = 0u32;
        let mut last_start = 0u32;
        let mut covered_until = 0usize;

        for highlight in highlights(parsed) {
            let Some((token_type, modifiers)) = Self::classify_highlight(highlight.kind) else {
                continue;
            };
            // Clients reject overlapping tokens; the first one at a spot wins.
            if highlight.begin < covered_until || highlight.begin >= highlight.end {
                continue;
            }
            covered_until = highlight.end;

            // Tokens may not span lines, so block comments are split.
            let mut begin = highlight.begin;
            while begin < highlight.end {
                let line_end = text[begin..highlight.end]
                    .find('\n')
                    .map_or(highlight.end, |len| begin + len);
                let (line, start) = index.utf16_position(begin);
                let (_, end) = index.utf16_position(line_end);
                let length = end.saturating_sub(start);
                if length > 0 {
                    let delta_line = line.saturating_sub(last_line);
                    let delta_start = if delta_line == 0 {
                        start.saturating_sub(last_start)
                    } else {
                        start
                    };
                    data.push(SemanticToken {
                        delta_line,
                        delta_start,
                        length,
                        token_type,
                        token_modifiers_bitset: modifiers,
                    });
                    last_line = line;
                    last_start = start;
                }
                begin = line_end + 1;
            }
        }

        SemanticTokens {
            result_id: None,
            data,
        }
    }
}
