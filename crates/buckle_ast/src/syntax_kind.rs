//! SyntaxKind enum - all token and node kinds in the Buckle syntax tree.

/// The kind of a syntax token or node.
///
/// Variants are grouped so range checks work: punctuation, then keywords,
/// then nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum SyntaxKind {
    // ========================================================================
    // Tokens
    // ========================================================================
    BadToken = 0,
    EndOfFileToken = 1,

    // Literals and names
    IdentifierToken = 2,
    NumericLiteralToken = 3,
    StringLiteralToken = 4,

    // Punctuation
    OpenParenToken = 10,
    CloseParenToken = 11,
    OpenBraceToken = 12,
    CloseBraceToken = 13,
    OpenBracketToken = 14,
    CloseBracketToken = 15,
    SemicolonToken = 16,
    CommaToken = 17,

    // Operators
    PlusToken = 18,
    MinusToken = 19,
    AsteriskToken = 20,
    SlashToken = 21,
    AsteriskAsteriskToken = 22,
    AmpersandToken = 23,
    AmpersandAmpersandToken = 24,
    PipeToken = 25,
    PipePipeToken = 26,
    CaretToken = 27,
    TildeToken = 28,
    ExclamationToken = 29,
    EqualsToken = 30,
    EqualsEqualsToken = 31,
    ExclamationEqualsToken = 32,
    LessThanToken = 33,
    LessThanEqualsToken = 34,
    LessThanLessThanToken = 35,
    GreaterThanToken = 36,
    GreaterThanEqualsToken = 37,
    GreaterThanGreaterThanToken = 38,
    PlusPlusToken = 39,
    MinusMinusToken = 40,

    // Compound assignment
    PlusEqualsToken = 41,
    MinusEqualsToken = 42,
    AsteriskEqualsToken = 43,
    SlashEqualsToken = 44,
    AsteriskAsteriskEqualsToken = 45,
    AmpersandEqualsToken = 46,
    PipeEqualsToken = 47,
    CaretEqualsToken = 48,
    LessThanLessThanEqualsToken = 49,
    GreaterThanGreaterThanEqualsToken = 50,

    // ========================================================================
    // Keywords
    // ========================================================================
    TrueKeyword = 60,
    FalseKeyword = 61,
    NullKeyword = 62,
    AutoKeyword = 63,
    VarKeyword = 64,
    LetKeyword = 65,
    ConstKeyword = 66,
    RefKeyword = 67,
    IfKeyword = 68,
    ElseKeyword = 69,
    WhileKeyword = 70,
    ForKeyword = 71,
    DoKeyword = 72,
    BreakKeyword = 73,
    ContinueKeyword = 74,
    TryKeyword = 75,
    CatchKeyword = 76,
    FinallyKeyword = 77,
    ReturnKeyword = 78,
    IsKeyword = 79,
    IsntKeyword = 80,

    // ========================================================================
    // Nodes
    // ========================================================================
    CompilationUnit = 100,
    FunctionDeclaration = 101,
    GlobalStatement = 102,
    Parameter = 103,
    TypeClause = 104,

    // Statements
    BlockStatement = 110,
    VariableDeclarationStatement = 111,
    IfStatement = 112,
    ElseClause = 113,
    WhileStatement = 114,
    DoWhileStatement = 115,
    ForStatement = 116,
    BreakStatement = 117,
    ContinueStatement = 118,
    ReturnStatement = 119,
    TryStatement = 120,
    CatchClause = 121,
    FinallyClause = 122,
    ExpressionStatement = 123,
    EmptyStatement = 124,
    LocalFunctionStatement = 125,

    // Expressions
    LiteralExpression = 130,
    NameExpression = 131,
    AssignmentExpression = 132,
    CompoundAssignmentExpression = 133,
    PrefixExpression = 134,
    UnaryExpression = 135,
    BinaryExpression = 136,
    ParenthesizedExpression = 137,
    CallExpression = 138,
    IndexExpression = 139,
    InitializerListExpression = 140,
    ReferenceExpression = 141,
    InlineFunctionExpression = 142,
    EmptyExpression = 143,
}

impl SyntaxKind {
    pub fn is_keyword(self) -> bool {
        self >= SyntaxKind::TrueKeyword && self <= SyntaxKind::IsntKeyword
    }

    pub fn is_punctuation(self) -> bool {
        self >= SyntaxKind::OpenParenToken && self <= SyntaxKind::GreaterThanGreaterThanEqualsToken
    }

    pub fn is_token(self) -> bool {
        self < SyntaxKind::CompilationUnit
    }

    pub fn is_compound_assignment(self) -> bool {
        self >= SyntaxKind::PlusEqualsToken && self <= SyntaxKind::GreaterThanGreaterThanEqualsToken
    }

    /// The binary operator a compound assignment applies, e.g. `+=` to `+`.
    pub fn compound_operator(self) -> Option<SyntaxKind> {
        match self {
            SyntaxKind::PlusEqualsToken => Some(SyntaxKind::PlusToken),
            SyntaxKind::MinusEqualsToken => Some(SyntaxKind::MinusToken),
            SyntaxKind::AsteriskEqualsToken => Some(SyntaxKind::AsteriskToken),
            SyntaxKind::SlashEqualsToken => Some(SyntaxKind::SlashToken),
            SyntaxKind::AsteriskAsteriskEqualsToken => Some(SyntaxKind::AsteriskAsteriskToken),
            SyntaxKind::AmpersandEqualsToken => Some(SyntaxKind::AmpersandToken),
            SyntaxKind::PipeEqualsToken => Some(SyntaxKind::PipeToken),
            SyntaxKind::CaretEqualsToken => Some(SyntaxKind::CaretToken),
            SyntaxKind::LessThanLessThanEqualsToken => Some(SyntaxKind::LessThanLessThanToken),
            SyntaxKind::GreaterThanGreaterThanEqualsToken => Some(SyntaxKind::GreaterThanGreaterThanToken),
            _ => None,
        }
    }

    pub fn keyword_text(self) -> Option<&'static str> {
        match self {
            SyntaxKind::TrueKeyword => Some("true"),
            SyntaxKind::FalseKeyword => Some("false"),
            SyntaxKind::NullKeyword => Some("null"),
            SyntaxKind::AutoKeyword => Some("auto"),
            SyntaxKind::VarKeyword => Some("var"),
            SyntaxKind::LetKeyword => Some("let"),
            SyntaxKind::ConstKeyword => Some("const"),
            SyntaxKind::RefKeyword => Some("ref"),
            SyntaxKind::IfKeyword => Some("if"),
            SyntaxKind::ElseKeyword => Some("else"),
            SyntaxKind::WhileKeyword => Some("while"),
            SyntaxKind::ForKeyword => Some("for"),
            SyntaxKind::DoKeyword => Some("do"),
            SyntaxKind::BreakKeyword => Some("break"),
            SyntaxKind::ContinueKeyword => Some("continue"),
            SyntaxKind::TryKeyword => Some("try"),
            SyntaxKind::CatchKeyword => Some("catch"),
            SyntaxKind::FinallyKeyword => Some("finally"),
            SyntaxKind::ReturnKeyword => Some("return"),
            SyntaxKind::IsKeyword => Some("is"),
            SyntaxKind::IsntKeyword => Some("isnt"),
            _ => None,
        }
    }

    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        match text {
            "true" => Some(SyntaxKind::TrueKeyword),
            "false" => Some(SyntaxKind::FalseKeyword),
            "null" => Some(SyntaxKind::NullKeyword),
            "auto" => Some(SyntaxKind::AutoKeyword),
            "var" => Some(SyntaxKind::VarKeyword),
            "let" => Some(SyntaxKind::LetKeyword),
            "const" => Some(SyntaxKind::ConstKeyword),
            "ref" => Some(SyntaxKind::RefKeyword),
            "if" => Some(SyntaxKind::IfKeyword),
            "else" => Some(SyntaxKind::ElseKeyword),
            "while" => Some(SyntaxKind::WhileKeyword),
            "for" => Some(SyntaxKind::ForKeyword),
            "do" => Some(SyntaxKind::DoKeyword),
            "break" => Some(SyntaxKind::BreakKeyword),
            "continue" => Some(SyntaxKind::ContinueKeyword),
            "try" => Some(SyntaxKind::TryKeyword),
            "catch" => Some(SyntaxKind::CatchKeyword),
            "finally" => Some(SyntaxKind::FinallyKeyword),
            "return" => Some(SyntaxKind::ReturnKeyword),
            "is" => Some(SyntaxKind::IsKeyword),
            "isnt" => Some(SyntaxKind::IsntKeyword),
            _ => None,
        }
    }

    pub fn punctuation_text(self) -> Option<&'static str> {
        match self {
            SyntaxKind::OpenParenToken => Some("("),
            SyntaxKind::CloseParenToken => Some(")"),
            SyntaxKind::OpenBraceToken => Some("{"),
            SyntaxKind::CloseBraceToken => Some("}"),
            SyntaxKind::OpenBracketToken => Some("["),
            SyntaxKind::CloseBracketToken => Some("]"),
            SyntaxKind::SemicolonToken => Some(";"),
            SyntaxKind::CommaToken => Some(","),
            SyntaxKind::PlusToken => Some("+"),
            SyntaxKind::MinusToken => Some("-"),
            SyntaxKind::AsteriskToken => Some("*"),
            SyntaxKind::SlashToken => Some("/"),
            SyntaxKind::AsteriskAsteriskToken => Some("**"),
            SyntaxKind::AmpersandToken => Some("&"),
            SyntaxKind::AmpersandAmpersandToken => Some("&&"),
            SyntaxKind::PipeToken => Some("|"),
            SyntaxKind::PipePipeToken => Some("||"),
            SyntaxKind::CaretToken => Some("^"),
            SyntaxKind::TildeToken => Some("~"),
            SyntaxKind::ExclamationToken => Some("!"),
            SyntaxKind::EqualsToken => Some("="),
            SyntaxKind::EqualsEqualsToken => Some("=="),
            SyntaxKind::ExclamationEqualsToken => Some("!="),
            SyntaxKind::LessThanToken => Some("<"),
            SyntaxKind::LessThanEqualsToken => Some("<="),
            SyntaxKind::LessThanLessThanToken => Some("<<"),
            SyntaxKind::GreaterThanToken => Some(">"),
            SyntaxKind::GreaterThanEqualsToken => Some(">="),
            SyntaxKind::GreaterThanGreaterThanToken => Some(">>"),
            SyntaxKind::PlusPlusToken => Some("++"),
            SyntaxKind::MinusMinusToken => Some("--"),
            SyntaxKind::PlusEqualsToken => Some("+="),
            SyntaxKind::MinusEqualsToken => Some("-="),
            SyntaxKind::AsteriskEqualsToken => Some("*="),
            SyntaxKind::SlashEqualsToken => Some("/="),
            SyntaxKind::AsteriskAsteriskEqualsToken => Some("**="),
            SyntaxKind::AmpersandEqualsToken => Some("&="),
            SyntaxKind::PipeEqualsToken => Some("|="),
            SyntaxKind::CaretEqualsToken => Some("^="),
            SyntaxKind::LessThanLessThanEqualsToken => Some("<<="),
            SyntaxKind::GreaterThanGreaterThanEqualsToken => Some(">>="),
            _ => None,
        }
    }

    /// Fixed source text of a token kind, if it has one.
    pub fn text(self) -> Option<&'static str> {
        self.punctuation_text().or_else(|| self.keyword_text())
    }

    /// How the token is named in "expected ..." diagnostics.
    pub fn display_name(self) -> String {
        match self.text() {
            Some(text) => format!("'{}'", text),
            None => match self {
                SyntaxKind::IdentifierToken => "identifier".to_string(),
                SyntaxKind::NumericLiteralToken => "numeric literal".to_string(),
                SyntaxKind::StringLiteralToken => "string literal".to_string(),
                SyntaxKind::EndOfFileToken => "end of input".to_string(),
                other => format!("{:?}", other),
            },
        }
    }
}
