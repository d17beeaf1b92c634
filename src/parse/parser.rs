//! Recursive-descent parser for the declaration subset the binding
//! convention uses: namespaces, classes with bases/fields/methods, class
//! templates, enums, aliases and `[[clang::annotate]]` attributes.

use crate::domain::model::{Access, Location, RefKind};
use crate::parse::decl::{
    ParsedHeader, RawAlias, RawClass, RawEnum, RawEnumConstant, RawField, RawMethod, RawParam,
    RawType,
};
use crate::parse::lexer::{Token, TokenKind};
use crate::utils::error::{Result, ScanError};

const PRIMITIVE_HEADS: &[&str] = &["unsigned", "signed", "long", "short"];
const PRIMITIVE_TAILS: &[&str] = &["int", "char", "short", "long", "double", "float"];

pub fn parse_header(tokens: &[Token], file: &str) -> Result<ParsedHeader> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        file,
    };
    let mut header = ParsedHeader {
        path: file.to_string(),
        ..Default::default()
    };
    let mut namespaces = Vec::new();
    parser.parse_scope(&mut namespaces, &mut header, true)?;
    Ok(header)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_symbol(&self, sym: &str) -> bool {
        self.peek().map(|t| t.is_symbol(sym)).unwrap_or(false)
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.peek().and_then(|t| t.ident()) == Some(kw)
    }

    fn eat_symbol(&mut self, sym: &str) -> bool {
        if self.at_symbol(sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn location(&self) -> Location {
        let (line, column) = self
            .peek()
            .or_else(|| self.tokens.last())
            .map(|t| (t.line, t.column))
            .unwrap_or((1, 1));
        Location {
            file: self.file.to_string(),
            line,
            column,
        }
    }

    fn error(&self, message: impl Into<String>) -> ScanError {
        let loc = self.location();
        ScanError::SyntaxError {
            file: loc.file,
            line: loc.line,
            column: loc.column,
            message: message.into(),
        }
    }

    fn expect_symbol(&mut self, sym: &str) -> Result<()> {
        if self.eat_symbol(sym) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}', found {}",
                sym,
                self.describe_current()
            )))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Ident(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(format!(
                "expected identifier, found {}",
                self.describe_current()
            ))),
        }
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            Some(t) => format!("'{}'", t.spelling()),
            None => "end of file".to_string(),
        }
    }

    fn current_namespace(namespaces: &[String]) -> Option<String> {
        if namespaces.is_empty() {
            None
        } else {
            Some(namespaces.join("::"))
        }
    }

    fn parse_scope(
        &mut self,
        namespaces: &mut Vec<String>,
        header: &mut ParsedHeader,
        top_level: bool,
    ) -> Result<()> {
        let mut pending_annotation: Option<String> = None;

        loop {
            if self.peek().is_none() {
                if top_level {
                    return Ok(());
                }
                return Err(self.error("unexpected end of file inside namespace"));
            }

            if self.at_symbol("}") {
                if top_level {
                    return Err(self.error("unmatched '}'"));
                }
                return Ok(());
            }

            if self.at_symbol("[[") {
                pending_annotation = self.parse_attribute()?;
                continue;
            }

            if self.eat_symbol(";") {
                continue;
            }

            if self.eat_keyword("namespace") {
                let mut name = self.expect_ident()?;
                while self.eat_symbol("::") {
                    name.push_str("::");
                    name.push_str(&self.expect_ident()?);
                }
                self.expect_symbol("{")?;
                namespaces.push(name);
                self.parse_scope(namespaces, header, false)?;
                self.expect_symbol("}")?;
                self.eat_symbol(";");
                namespaces.pop();
                continue;
            }

            if self.eat_keyword("template") {
                let params = self.parse_template_params()?;
                let is_struct = if self.eat_keyword("class") {
                    false
                } else if self.eat_keyword("struct") {
                    true
                } else {
                    return Err(self.error("only class templates are supported"));
                };
                if let Some(class) = self.parse_class(
                    Self::current_namespace(namespaces),
                    is_struct,
                    params,
                    pending_annotation.take(),
                    header,
                )? {
                    header.classes.push(class);
                }
                continue;
            }

            if self.at_keyword("class") || self.at_keyword("struct") {
                let is_struct = self.at_keyword("struct");
                self.pos += 1;
                if let Some(class) = self.parse_class(
                    Self::current_namespace(namespaces),
                    is_struct,
                    Vec::new(),
                    pending_annotation.take(),
                    header,
                )? {
                    header.classes.push(class);
                }
                continue;
            }

            if self.eat_keyword("enum") {
                if let Some(en) = self.parse_enum(Self::current_namespace(namespaces))? {
                    header.enums.push(en);
                }
                continue;
            }

            if self.at_keyword("using") {
                if let Some(alias) = self.parse_using(Self::current_namespace(namespaces))? {
                    header.aliases.push(alias);
                }
                continue;
            }

            if self.eat_keyword("typedef") {
                let location = self.location();
                let target = self.parse_type()?;
                let name = self.expect_ident()?;
                self.expect_symbol(";")?;
                header.aliases.push(RawAlias {
                    name,
                    namespace: Self::current_namespace(namespaces),
                    target,
                    location,
                });
                continue;
            }

            return Err(self.error(format!(
                "unexpected {} at file scope",
                self.describe_current()
            )));
        }
    }

    fn parse_template_params(&mut self) -> Result<Vec<String>> {
        self.expect_symbol("<")?;
        let mut params = Vec::new();
        loop {
            if !(self.eat_keyword("class") || self.eat_keyword("typename")) {
                return Err(self.error("expected 'class' or 'typename' template parameter"));
            }
            params.push(self.expect_ident()?);
            if self.eat_symbol(",") {
                continue;
            }
            self.expect_symbol(">")?;
            return Ok(params);
        }
    }

    fn parse_using(&mut self, namespace: Option<String>) -> Result<Option<RawAlias>> {
        let location = self.location();
        self.eat_keyword("using");
        if self.eat_keyword("namespace") {
            self.skip_to_semicolon();
            return Ok(None);
        }
        let name = self.expect_ident()?;
        self.expect_symbol("=")?;
        let target = self.parse_type()?;
        self.expect_symbol(";")?;
        Ok(Some(RawAlias {
            name,
            namespace,
            target,
            location,
        }))
    }

    fn parse_attribute(&mut self) -> Result<Option<String>> {
        self.expect_symbol("[[")?;
        let mut annotation = None;
        let mut fallback = None;
        while !self.at_symbol("]]") {
            match self.advance().map(|t| t.kind.clone()) {
                Some(TokenKind::StrLit(s)) => annotation = Some(s),
                Some(TokenKind::Ident(name)) => {
                    if name != "clang" && name != "annotate" {
                        fallback = Some(name);
                    }
                }
                Some(_) => {}
                None => return Err(self.error("unterminated attribute")),
            }
        }
        self.expect_symbol("]]")?;
        Ok(annotation.or(fallback))
    }

    fn parse_class(
        &mut self,
        namespace: Option<String>,
        is_struct: bool,
        template_params: Vec<String>,
        annotation: Option<String>,
        header: &mut ParsedHeader,
    ) -> Result<Option<RawClass>> {
        let location = self.location();
        let name = self.expect_ident()?;

        // Forward declaration; definitions elsewhere are picked up when their
        // own header is scanned.
        if self.eat_symbol(";") {
            return Ok(None);
        }

        let mut bases = Vec::new();
        if self.eat_symbol(":") {
            loop {
                while self.eat_keyword("public")
                    || self.eat_keyword("protected")
                    || self.eat_keyword("private")
                    || self.eat_keyword("virtual")
                {}
                bases.push(self.parse_type()?);
                if !self.eat_symbol(",") {
                    break;
                }
            }
        }

        self.expect_symbol("{")?;

        let mut class = RawClass {
            name: name.clone(),
            namespace: namespace.clone(),
            is_struct,
            template_params,
            bases,
            fields: Vec::new(),
            methods: Vec::new(),
            annotation,
            location,
        };

        let mut access = if is_struct {
            Access::Public
        } else {
            Access::Private
        };
        let mut pending_annotation: Option<String> = None;

        loop {
            if self.at_symbol("}") {
                break;
            }
            if self.peek().is_none() {
                return Err(self.error(format!("unexpected end of file inside '{}'", name)));
            }

            if self.at_keyword("public") || self.at_keyword("protected") || self.at_keyword("private")
            {
                let label = self.expect_ident()?;
                self.expect_symbol(":")?;
                access = match label.as_str() {
                    "public" => Access::Public,
                    "protected" => Access::Protected,
                    _ => Access::Private,
                };
                continue;
            }

            if self.at_symbol("[[") {
                pending_annotation = self.parse_attribute()?;
                continue;
            }

            if self.eat_symbol(";") {
                continue;
            }

            if self.at_keyword("friend") || self.at_keyword("using") || self.at_keyword("typedef") {
                self.skip_to_semicolon();
                continue;
            }

            if self.eat_keyword("enum") {
                let nested_ns = match &namespace {
                    Some(ns) => Some(format!("{}::{}", ns, name)),
                    None => Some(name.clone()),
                };
                if let Some(en) = self.parse_enum(nested_ns)? {
                    header.enums.push(en);
                }
                continue;
            }

            // Destructor: not part of the exposed surface.
            if self.eat_symbol("~") {
                self.skip_member_tail();
                continue;
            }

            let mut is_virtual = false;
            let mut is_static = false;
            loop {
                if self.eat_keyword("virtual") {
                    is_virtual = true;
                } else if self.eat_keyword("static") {
                    is_static = true;
                } else if self.eat_keyword("inline")
                    || self.eat_keyword("constexpr")
                    || self.eat_keyword("mutable")
                    || self.eat_keyword("explicit")
                {
                } else {
                    break;
                }
            }

            // Constructor: name mirrors the class and is followed by '('.
            if self.peek().and_then(|t| t.ident()) == Some(name.as_str())
                && self.peek_at(1).map(|t| t.is_symbol("(")).unwrap_or(false)
            {
                self.pos += 1;
                self.skip_member_tail();
                continue;
            }

            let member_location = self.location();
            let ty = self.parse_type()?;
            let member_name = self.expect_ident()?;

            if self.eat_symbol("(") {
                let params = self.parse_params()?;
                let is_const = self.eat_keyword("const");
                let mut is_pure = false;
                if self.eat_symbol("=") {
                    if self.eat_keyword("default") || self.eat_keyword("delete") {
                        // Compiler-provided special member; nothing to record.
                    } else {
                        match self.advance().map(|t| t.kind.clone()) {
                            Some(TokenKind::Number(n)) if n == "0" => is_pure = true,
                            _ => return Err(self.error("expected '0' after '=' in pure specifier")),
                        }
                    }
                }
                if self.at_symbol("{") {
                    self.skip_balanced_braces()?;
                } else {
                    self.expect_symbol(";")?;
                }
                class.methods.push(RawMethod {
                    name: member_name,
                    ret: ty,
                    params,
                    is_virtual,
                    is_static,
                    is_const,
                    is_pure,
                    access,
                    annotation: pending_annotation.take(),
                    location: member_location,
                });
            } else {
                let mut init = None;
                if self.eat_symbol("=") {
                    let mut spelling = String::new();
                    if self.eat_symbol("-") {
                        spelling.push('-');
                    }
                    match self.advance().map(|t| t.spelling()) {
                        Some(s) => spelling.push_str(&s),
                        None => return Err(self.error("unexpected end of file in initializer")),
                    }
                    init = Some(spelling);
                    self.skip_to_semicolon();
                } else {
                    self.expect_symbol(";")?;
                }
                class.fields.push(RawField {
                    name: member_name,
                    ty,
                    init,
                    access,
                    location: member_location,
                });
                pending_annotation = None;
            }
        }

        self.expect_symbol("}")?;
        self.eat_symbol(";");
        Ok(Some(class))
    }

    fn parse_params(&mut self) -> Result<Vec<RawParam>> {
        let mut params = Vec::new();
        if self.eat_symbol(")") {
            return Ok(params);
        }
        loop {
            let location = self.location();
            // `(void)` marks an empty parameter list.
            if self.at_keyword("void")
                && self.peek_at(1).map(|t| t.is_symbol(")")).unwrap_or(false)
            {
                self.pos += 1;
                self.expect_symbol(")")?;
                return Ok(params);
            }
            let ty = self.parse_type()?;
            let name = match self.peek().and_then(|t| t.ident()) {
                Some(n) => {
                    let n = n.to_string();
                    self.pos += 1;
                    n
                }
                None => String::new(),
            };
            if self.eat_symbol("=") {
                // Default argument; the value is irrelevant to the scan.
                while !(self.at_symbol(",") || self.at_symbol(")")) {
                    if self.advance().is_none() {
                        return Err(self.error("unexpected end of file in default argument"));
                    }
                }
            }
            params.push(RawParam { name, ty, location });
            if self.eat_symbol(",") {
                continue;
            }
            self.expect_symbol(")")?;
            return Ok(params);
        }
    }

    fn parse_type(&mut self) -> Result<RawType> {
        let mut is_const = false;
        while self.eat_keyword("const") || self.eat_keyword("volatile") {
            is_const = true;
        }

        let mut segments = Vec::new();

        // Multi-word primitives collapse into a single segment.
        if PRIMITIVE_HEADS.contains(&self.peek().and_then(|t| t.ident()).unwrap_or("")) {
            let mut words = Vec::new();
            while let Some(word) = self.peek().and_then(|t| t.ident()) {
                if PRIMITIVE_HEADS.contains(&word)
                    || (!words.is_empty() && PRIMITIVE_TAILS.contains(&word))
                {
                    words.push(word.to_string());
                    self.pos += 1;
                } else {
                    break;
                }
            }
            segments.push(words.join(" "));
        } else {
            segments.push(self.expect_ident()?);
            while self.eat_symbol("::") {
                segments.push(self.expect_ident()?);
            }
        }

        let mut template_args = Vec::new();
        if self.eat_symbol("<") {
            loop {
                template_args.push(self.parse_type()?);
                if self.eat_symbol(",") {
                    continue;
                }
                self.expect_symbol(">")?;
                break;
            }
        }

        let mut ref_kind = None;
        loop {
            if self.eat_symbol("*") {
                ref_kind = Some(RefKind::Pointer);
                self.eat_keyword("const");
            } else if self.eat_symbol("&&") {
                ref_kind = Some(RefKind::Rvalue);
            } else if self.eat_symbol("&") {
                ref_kind = Some(RefKind::Lvalue);
            } else {
                break;
            }
        }

        Ok(RawType {
            is_const,
            segments,
            template_args,
            ref_kind,
        })
    }

    fn parse_enum(&mut self, namespace: Option<String>) -> Result<Option<RawEnum>> {
        let location = self.location();
        let is_scoped = self.eat_keyword("class") || self.eat_keyword("struct");
        let name = self.expect_ident()?;

        if self.eat_symbol(":") {
            self.parse_type()?;
        }

        // Opaque enum declaration.
        if self.eat_symbol(";") {
            return Ok(None);
        }

        self.expect_symbol("{")?;
        let mut constants = Vec::new();
        let mut next_value: i64 = 0;
        loop {
            if self.eat_symbol("}") {
                break;
            }
            let constant_name = self.expect_ident()?;
            let value = if self.eat_symbol("=") {
                let negative = self.eat_symbol("-");
                let spelling = match self.advance().map(|t| t.kind.clone()) {
                    Some(TokenKind::Number(n)) => n,
                    _ => return Err(self.error("expected numeric enum value")),
                };
                let parsed = parse_int_literal(&spelling)
                    .ok_or_else(|| self.error(format!("invalid enum value '{}'", spelling)))?;
                if negative {
                    -parsed
                } else {
                    parsed
                }
            } else {
                next_value
            };
            next_value = value + 1;
            constants.push(RawEnumConstant {
                name: constant_name,
                value,
            });
            if self.eat_symbol(",") {
                continue;
            }
            self.expect_symbol("}")?;
            break;
        }
        self.eat_symbol(";");

        Ok(Some(RawEnum {
            name,
            namespace,
            is_scoped,
            constants,
            location,
        }))
    }

    /// Skips the remainder of a member we do not record (constructor,
    /// destructor): parameter list, qualifiers and an optional inline body.
    fn skip_member_tail(&mut self) {
        let mut depth_parens = 0usize;
        while let Some(tok) = self.peek() {
            if tok.is_symbol("(") {
                depth_parens += 1;
            } else if tok.is_symbol(")") {
                depth_parens = depth_parens.saturating_sub(1);
            } else if tok.is_symbol("{") && depth_parens == 0 {
                let _ = self.skip_balanced_braces();
                return;
            } else if tok.is_symbol(";") && depth_parens == 0 {
                self.pos += 1;
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_to_semicolon(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            if tok.is_symbol("{") {
                depth += 1;
            } else if tok.is_symbol("}") {
                depth = depth.saturating_sub(1);
            } else if tok.is_symbol(";") && depth == 0 {
                self.pos += 1;
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_balanced_braces(&mut self) -> Result<()> {
        self.expect_symbol("{")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Some(tok) if tok.is_symbol("{") => depth += 1,
                Some(tok) if tok.is_symbol("}") => depth -= 1,
                Some(_) => {}
                None => return Err(self.error("unterminated block")),
            }
        }
        Ok(())
    }
}

/// Parses a bare type spelling such as a `#define` replacement (`int`,
/// `spark::handle<int>`). Returns `None` when the text is not a plain type.
pub fn parse_type_spelling(text: &str) -> Option<RawType> {
    let tokens = crate::parse::lexer::tokenize(text, "<define>").ok()?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        file: "<define>",
    };
    let ty = parser.parse_type().ok()?;
    if parser.pos == tokens.len() {
        Some(ty)
    } else {
        None
    }
}

fn parse_int_literal(spelling: &str) -> Option<i64> {
    let trimmed = spelling.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        trimmed.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::lexer::tokenize;

    fn parse(src: &str) -> ParsedHeader {
        let tokens = tokenize(src, "test.h").unwrap();
        parse_header(&tokens, "test.h").unwrap()
    }

    #[test]
    fn parses_an_interface_with_pure_virtual_methods() {
        let header = parse(
            "class IService {};\n\
             class PresenceService : public IService {\n\
             public:\n\
                 virtual void publish(int state) = 0;\n\
                 virtual double* snapshot(float window) = 0;\n\
             };\n",
        );
        assert_eq!(header.classes.len(), 2);
        let service = &header.classes[1];
        assert_eq!(service.name, "PresenceService");
        assert_eq!(service.bases[0].qualified(), "IService");
        assert_eq!(service.methods.len(), 2);
        let publish = &service.methods[0];
        assert!(publish.is_virtual && publish.is_pure);
        assert_eq!(publish.access, Access::Public);
        assert_eq!(publish.params[0].ty.name(), "int");
        let snapshot = &service.methods[1];
        assert_eq!(snapshot.ret.name(), "double");
        assert_eq!(snapshot.ret.ref_kind, Some(RefKind::Pointer));
    }

    #[test]
    fn parses_fields_with_initializers_and_access() {
        let header = parse(
            "class PresenceRecord {\n\
             public:\n\
                 int state = 0;\n\
                 double lastSeen;\n\
                 char marker = 'a';\n\
             private:\n\
                 bool hidden = false;\n\
             };\n",
        );
        let record = &header.classes[0];
        assert_eq!(record.fields.len(), 4);
        assert_eq!(record.fields[0].init.as_deref(), Some("0"));
        assert_eq!(record.fields[1].init, None);
        assert_eq!(record.fields[2].init.as_deref(), Some("'a'"));
        assert_eq!(record.fields[3].access, Access::Private);
    }

    #[test]
    fn parses_namespaced_template_classes() {
        let header = parse(
            "namespace spark {\n\
                 template <class T>\n\
                 class handle {\n\
                     T a;\n\
                 };\n\
             }\n",
        );
        let handle = &header.classes[0];
        assert_eq!(handle.name, "handle");
        assert_eq!(handle.namespace.as_deref(), Some("spark"));
        assert_eq!(handle.template_params, vec!["T".to_string()]);
    }

    #[test]
    fn parses_template_usage_and_const_refs() {
        let header = parse(
            "class IViewModel {};\n\
             class RosterViewModel : public IViewModel {\n\
             public:\n\
                 virtual void CreateInstance(const spark::handle<ICoreFramework>& core, const int& capacity);\n\
             };\n",
        );
        let vm = &header.classes[1];
        let create = &vm.methods[0];
        let core = &create.params[0].ty;
        assert!(core.is_const);
        assert_eq!(core.qualified(), "spark::handle");
        assert_eq!(core.template_args[0].qualified(), "ICoreFramework");
        assert_eq!(core.ref_kind, Some(RefKind::Lvalue));
    }

    #[test]
    fn parses_scoped_enums_with_values() {
        let header = parse("enum class PresenceState { Offline = 0, Online, Away = 4 };\n");
        let en = &header.enums[0];
        assert!(en.is_scoped);
        let values: Vec<i64> = en.constants.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![0, 1, 4]);
    }

    #[test]
    fn records_annotations_on_methods() {
        let header = parse(
            "class IService {};\n\
             class PresenceService : public IService {\n\
             public:\n\
                 [[clang::annotate(\"generate_binds\")]]\n\
                 virtual void publish(int state) = 0;\n\
                 virtual int internalOnly() = 0;\n\
             };\n",
        );
        let service = &header.classes[1];
        assert_eq!(
            service.methods[0].annotation.as_deref(),
            Some("generate_binds")
        );
        assert_eq!(service.methods[1].annotation, None);
    }

    #[test]
    fn skips_constructors_and_destructors() {
        let header = parse(
            "class Widget {\n\
             public:\n\
                 Widget();\n\
                 ~Widget();\n\
                 int size() const;\n\
             };\n",
        );
        let widget = &header.classes[0];
        assert_eq!(widget.methods.len(), 1);
        assert_eq!(widget.methods[0].name, "size");
        assert!(widget.methods[0].is_const);
    }

    #[test]
    fn parses_using_aliases() {
        let header = parse("namespace spark { using ms_time_t = long; }\n");
        let alias = &header.aliases[0];
        assert_eq!(alias.name, "ms_time_t");
        assert_eq!(alias.namespace.as_deref(), Some("spark"));
        assert_eq!(alias.target.name(), "long");
    }

    #[test]
    fn void_parameter_list_is_empty() {
        let header = parse(
            "class C {\n\
             public:\n\
                 int getA(void);\n\
             };\n",
        );
        assert!(header.classes[0].methods[0].params.is_empty());
    }

    #[test]
    fn reports_syntax_errors_with_location() {
        let tokens = tokenize("class {", "broken.h").unwrap();
        let err = parse_header(&tokens, "broken.h").unwrap_err();
        assert!(err.to_string().starts_with("broken.h:1:"));
    }
}
