#[cfg(test)]
mod scanner_tests {
    use minipy::scanner::*;
    use minipy::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(
            tokens.len(),
            expected.len(),
            "token count mismatch, got: {:?}",
            tokens
        );

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_operators() {
        assert_token_sequence(
            "x = 1 + 2 * 3 - 4 / 5\n",
            &[
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::INT(1), "1"),
                (TokenType::PLUS, "+"),
                (TokenType::INT(2), "2"),
                (TokenType::STAR, "*"),
                (TokenType::INT(3), "3"),
                (TokenType::MINUS, "-"),
                (TokenType::INT(4), "4"),
                (TokenType::SLASH, "/"),
                (TokenType::INT(5), "5"),
                (TokenType::NEWLINE, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_augmented_and_comparison() {
        assert_token_sequence(
            "a += 1\nb -= 2\nc *= 3\nd /= 4\ne == f < g > h\n",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::PLUS_EQUAL, "+="),
                (TokenType::INT(1), "1"),
                (TokenType::NEWLINE, ""),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::MINUS_EQUAL, "-="),
                (TokenType::INT(2), "2"),
                (TokenType::NEWLINE, ""),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::STAR_EQUAL, "*="),
                (TokenType::INT(3), "3"),
                (TokenType::NEWLINE, ""),
                (TokenType::IDENTIFIER, "d"),
                (TokenType::SLASH_EQUAL, "/="),
                (TokenType::INT(4), "4"),
                (TokenType::NEWLINE, ""),
                (TokenType::IDENTIFIER, "e"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::IDENTIFIER, "f"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "g"),
                (TokenType::GREATER, ">"),
                (TokenType::IDENTIFIER, "h"),
                (TokenType::NEWLINE, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_vs_identifiers() {
        assert_token_sequence(
            "def classy(x): pass\n",
            &[
                (TokenType::DEF, "def"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::COLON, ":"),
                (TokenType::PASS, "pass"),
                (TokenType::NEWLINE, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_indentation_block() {
        let source = "if x:\n    y = 1\nz = 2\n";

        assert_token_sequence(
            source,
            &[
                (TokenType::IF, "if"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::COLON, ":"),
                (TokenType::NEWLINE, ""),
                (TokenType::INDENT, ""),
                (TokenType::IDENTIFIER, "y"),
                (TokenType::EQUAL, "="),
                (TokenType::INT(1), "1"),
                (TokenType::NEWLINE, ""),
                (TokenType::DEDENT, ""),
                (TokenType::IDENTIFIER, "z"),
                (TokenType::EQUAL, "="),
                (TokenType::INT(2), "2"),
                (TokenType::NEWLINE, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_nested_dedent_burst_at_eof() {
        // Two open blocks at end of input: final NEWLINE then two DEDENTs.
        let source = "while a:\n    while b:\n        c = 1";

        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();
        let tail: Vec<&TokenType> = tokens
            .iter()
            .rev()
            .take(4)
            .map(|t| &t.token_type)
            .collect();

        // reversed: EOF, DEDENT, DEDENT, NEWLINE
        assert_eq!(tail[0], &TokenType::EOF);
        assert_eq!(tail[1], &TokenType::DEDENT);
        assert_eq!(tail[2], &TokenType::DEDENT);
        assert_eq!(tail[3], &TokenType::NEWLINE);
    }

    #[test]
    fn test_scanner_06_blank_and_comment_lines_are_insignificant() {
        let source = "a = 1\n\n# a comment line\n    # indented comment\nb = 2\n";

        assert_token_sequence(
            source,
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::EQUAL, "="),
                (TokenType::INT(1), "1"),
                (TokenType::NEWLINE, ""),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EQUAL, "="),
                (TokenType::INT(2), "2"),
                (TokenType::NEWLINE, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_07_implicit_line_joining() {
        let source = "x = [1,\n     2,\n     3]\n";

        assert_token_sequence(
            source,
            &[
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::INT(1), "1"),
                (TokenType::COMMA, ","),
                (TokenType::INT(2), "2"),
                (TokenType::COMMA, ","),
                (TokenType::INT(3), "3"),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::NEWLINE, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_08_string_escapes() {
        let scanner = Scanner::new(b"s = 'a\\nb\\t\\'c\\\"'\n");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let string_token = tokens
            .iter()
            .find(|t| matches!(t.token_type, TokenType::STRING(_)))
            .expect("no string token produced");

        match &string_token.token_type {
            TokenType::STRING(value) => assert_eq!(value, "a\nb\t'c\""),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_scanner_09_int_literal_value() {
        let scanner = Scanner::new(b"9223372036854775807\n");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        match tokens[0].token_type {
            TokenType::INT(n) => assert_eq!(n, i64::MAX),
            ref other => panic!("expected INT, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_10_int_literal_overflow_errors() {
        let scanner = Scanner::new(b"9223372036854775808\n");
        let errors: Vec<_> = scanner.filter_map(Result::err).collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Integer literal too large"));
    }

    #[test]
    fn test_scanner_11_unterminated_string_errors() {
        let scanner = Scanner::new(b"s = 'oops\n");
        let errors: Vec<_> = scanner.filter_map(Result::err).collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string"));
    }

    #[test]
    fn test_scanner_12_tab_indentation_errors() {
        let scanner = Scanner::new(b"if x:\n\ty = 1\n");
        let errors: Vec<_> = scanner.filter_map(Result::err).collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Tabs are not allowed"));
    }

    #[test]
    fn test_scanner_13_inconsistent_dedent_errors() {
        let source = "if x:\n    y = 1\n  z = 2\n";
        let scanner = Scanner::new(source.as_bytes());
        let errors: Vec<_> = scanner.filter_map(Result::err).collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Unindent does not match any outer indentation level"));
    }

    #[test]
    fn test_scanner_14_missing_trailing_newline_still_closes_line() {
        assert_token_sequence(
            "x = 1",
            &[
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::INT(1), "1"),
                (TokenType::NEWLINE, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_15_unexpected_character_errors() {
        let scanner = Scanner::new(b"a = 1 $ 2\n");
        let results: Vec<_> = scanner.collect();

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 1);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "unexpected message: {}",
                err
            );
        }
    }

    #[test]
    fn test_scanner_16_empty_source() {
        assert_token_sequence("", &[(TokenType::EOF, "")]);
    }
}
