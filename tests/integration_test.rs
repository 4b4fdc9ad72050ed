//! Integration Tests - End-to-end Settlement
//!
//! Drives JSON requests through the calculator and the batch job the
//! way the CLI does, checking the worked examples that define the
//! settlement rules.

use std::io::Cursor;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use racing_bet_settler::config::loader::parse_config;
use racing_bet_settler::domain::odds::OddsNotation;
use racing_bet_settler::domain::{CATALOG, SettlementError, SettlementRequest, SettlementResult};
use racing_bet_settler::usecases::{BetCalculator, CalculatorConfig, SettlementBatch};

fn settle_json(json: &str) -> Result<SettlementResult, SettlementError> {
    let request: SettlementRequest = serde_json::from_str(json).unwrap();
    BetCalculator::default().settle(&request)
}

// ---- Singles ----

#[test]
fn test_winning_single_decimal_odds() {
    let result = settle_json(
        r#"{"betTypeKey":"single","stakePerLine":10,"oddsNotation":"decimal",
            "selections":[{"name":"Kauto Star","oddsLiteral":"4.0","outcome":"win"}]}"#,
    )
    .unwrap();

    assert_eq!(result.bet_type, "Single");
    assert_eq!(result.total_stake, dec!(10));
    assert_eq!(result.total_returns, dec!(40));
    assert_eq!(result.total_profit, dec!(30));
}

#[test]
fn test_losing_single_returns_nothing() {
    let result = settle_json(
        r#"{"betTypeKey":"single","stakePerLine":"10","oddsNotation":"decimal",
            "selections":[{"name":"Denman","oddsLiteral":"4.0","outcome":"loss"}]}"#,
    )
    .unwrap();

    assert_eq!(result.total_returns, Decimal::ZERO);
    assert_eq!(result.total_profit, dec!(-10));
    assert_eq!(result.winning_sub_bet_count, 0);
    assert_eq!(result.losing_sub_bet_count(), 1);
}

#[test]
fn test_each_way_single_winner_collects_both_parts() {
    let result = settle_json(
        r#"{"betTypeKey":"single","stakePerLine":"10","oddsNotation":"fractional",
            "eachWay":{"placeFraction":[1,4],"placesPaid":3},
            "selections":[{"name":"Frankel","oddsLiteral":"4/1","outcome":"win"}]}"#,
    )
    .unwrap();

    let line = &result.sub_bets[0];
    assert_eq!(line.stake, dec!(20));
    assert_eq!(line.win_return, dec!(100));
    assert_eq!(line.place_return, dec!(40));
    assert_eq!(result.total_returns, dec!(140));
    assert!(result.explanation.contains("3 places paid"));
}

// ---- Multiples ----

#[test]
fn test_each_way_double_both_placed() {
    let result = settle_json(
        r#"{"betTypeKey":"double","stakePerLine":"1","oddsNotation":"decimal",
            "eachWay":{"placeFraction":[1,4]},
            "selections":[
              {"name":"A","oddsLiteral":"5.0","outcome":"place"},
              {"name":"B","oddsLiteral":"5.0","outcome":"place"}]}"#,
    )
    .unwrap();

    let line = &result.sub_bets[0];
    assert_eq!(line.win_return, Decimal::ZERO);
    // each leg pays 1 + 4 * 1/4 = 2.0 on the place part
    assert_eq!(line.place_return, dec!(8));
    assert_eq!(result.total_stake, dec!(2));
    assert_eq!(result.total_profit, dec!(6));
}

#[test]
fn test_trixie_stake_and_lines() {
    let result = settle_json(
        r#"{"betTypeKey":"Trixie","stakePerLine":"1",
            "selections":[
              {"name":"A","oddsLiteral":"1/1","outcome":"win"},
              {"name":"B","oddsLiteral":"2/1","outcome":"win"},
              {"name":"C","oddsLiteral":"3/1","outcome":"loss"}]}"#,
    )
    .unwrap();

    assert_eq!(result.sub_bets.len(), 4);
    assert_eq!(result.total_stake, dec!(4));
    // Only the A/B double wins: 2 * 3
    assert_eq!(result.total_returns, dec!(6));
    assert_eq!(result.winning_sub_bet_count, 1);
}

#[test]
fn test_rule4_reduces_yankee_returns() {
    let json = |rule4: &str| {
        format!(
            r#"{{"betTypeKey":"yankee","stakePerLine":"1","rule4Percent":"{rule4}",
                "selections":[
                  {{"name":"A","oddsLiteral":"4/1","outcome":"win"}},
                  {{"name":"B","oddsLiteral":"4/1","outcome":"win"}},
                  {{"name":"C","oddsLiteral":"4/1","outcome":"loss"}},
                  {{"name":"D","oddsLiteral":"4/1","outcome":"loss"}}]}}"#
        )
    };

    let full = settle_json(&json("0")).unwrap();
    let deducted = settle_json(&json("25")).unwrap();

    assert_eq!(full.total_returns, dec!(25));
    // 5.0 becomes 4.0 under a 25% deduction
    assert_eq!(deducted.total_returns, dec!(16));
    assert!(deducted.explanation.contains("Rule 4 deduction of 25%"));
}

#[test]
fn test_every_catalog_type_settles() {
    let calc = BetCalculator::default();
    for def in &CATALOG {
        let selections: Vec<String> = (0..def.required_selection_count)
            .map(|i| format!(r#"{{"name":"H{i}","oddsLiteral":"2/1","outcome":"win"}}"#))
            .collect();
        let json = format!(
            r#"{{"betTypeKey":"{}","stakePerLine":"1","selections":[{}]}}"#,
            def.key,
            selections.join(",")
        );
        let request: SettlementRequest = serde_json::from_str(&json).unwrap();
        let result = calc.settle(&request).unwrap();

        assert_eq!(result.sub_bets.len(), def.expected_sub_bet_count, "{}", def.name);
        assert_eq!(result.winning_sub_bet_count, def.expected_sub_bet_count);
        assert_eq!(result.total_stake, Decimal::from(def.expected_sub_bet_count));
    }
}

// ---- Errors ----

#[test]
fn test_zero_denominator_fails_loudly() {
    let err = settle_json(
        r#"{"betTypeKey":"double","stakePerLine":"1",
            "selections":[
              {"name":"A","oddsLiteral":"2/1","outcome":"win"},
              {"name":"B","oddsLiteral":"x/0","outcome":"loss"}]}"#,
    )
    .unwrap_err();

    assert!(matches!(err, SettlementError::OddsParse { ref literal, .. } if literal == "x/0"));
    assert!(err.is_user_error());
}

#[test]
fn test_wrong_selection_count() {
    let err = settle_json(
        r#"{"betTypeKey":"lucky15","stakePerLine":"1",
            "selections":[{"name":"A","oddsLiteral":"2/1","outcome":"win"}]}"#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        SettlementError::SelectionCountMismatch {
            bet_type: "Lucky 15".to_string(),
            expected: 4,
            actual: 1,
        }
    );
    assert_eq!(err.to_string(), "Lucky 15 requires 4 selections, got 1");
}

#[test]
fn test_zero_place_terms_rejected_at_parse() {
    let parsed: Result<SettlementRequest, _> = serde_json::from_str(
        r#"{"betTypeKey":"single","stakePerLine":"1","eachWay":{"placeFraction":[1,0]},
            "selections":[{"name":"A","oddsLiteral":"2/1","outcome":"win"}]}"#,
    );
    assert!(parsed.is_err());
}

#[test]
fn test_long_odds_goliath_overflow_is_typed() {
    let selections: Vec<String> = (0..8)
        .map(|i| format!(r#"{{"name":"H{i}","oddsLiteral":"100000","outcome":"win"}}"#))
        .collect();
    let json = format!(
        r#"{{"betTypeKey":"goliath","stakePerLine":"1","oddsNotation":"decimal","selections":[{}]}}"#,
        selections.join(",")
    );
    let request: SettlementRequest = serde_json::from_str(&json).unwrap();

    for parallel_folds in [false, true] {
        let calc = BetCalculator::new(CalculatorConfig { parallel_folds });
        let err = calc.settle(&request).unwrap_err();
        assert_eq!(err, SettlementError::ArithmeticOverflow("win return"));
        assert!(err.is_user_error());
    }
}

// ---- Notation ----

#[test]
fn test_notation_switch_settles_identically() {
    let request: SettlementRequest = serde_json::from_str(
        r#"{"betTypeKey":"patent","stakePerLine":"2",
            "selections":[
              {"name":"A","oddsLiteral":"11/4","outcome":"win"},
              {"name":"B","oddsLiteral":"5/2","outcome":"win"},
              {"name":"C","oddsLiteral":"1/2","outcome":"loss"}]}"#,
    )
    .unwrap();

    let decimal = request.with_notation(OddsNotation::Decimal).unwrap();
    assert_eq!(decimal.selections[0].odds_literal, "3.75");

    let calc = BetCalculator::default();
    assert_eq!(
        calc.settle(&request).unwrap().total_returns,
        calc.settle(&decimal).unwrap().total_returns
    );
}

// ---- Batch job ----

#[test]
fn test_batch_with_config() {
    let config = parse_config("[engine]\nparallel_folds = true\ndisplay_decimal_places = 2\n").unwrap();
    let batch = SettlementBatch::with_config(
        BetCalculator::new(config.engine.calculator()),
        config.engine.display_decimal_places,
    );

    let input = [
        r#"{"betId":"a","request":{"betTypeKey":"trixie","stakePerLine":"1","selections":[{"name":"A","oddsLiteral":"1/1","outcome":"win"},{"name":"B","oddsLiteral":"2/1","outcome":"win"},{"name":"C","oddsLiteral":"3/1","outcome":"loss"}]}}"#,
        r#"{"betId":"b","request":{"betTypeKey":"single","stakePerLine":"1","selections":[{"name":"A","oddsLiteral":"2/1"}]}}"#,
        r#"{"betId":"c","request":{"betTypeKey":"yankee","stakePerLine":"1","selections":[]}}"#,
    ]
    .join("\n");

    let report = batch.run(Cursor::new(input)).unwrap();
    assert_eq!(report.settled, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.total_stake, dec!(4));
    assert_eq!(report.total_returns, dec!(6));
    assert!(report.outcomes[1].error.as_deref().unwrap().starts_with("Invalid bet JSON"));
    assert!(report.outcomes[2].error.as_deref().unwrap().contains("requires 4 selections"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcomes"][0]["betId"], "a");
    assert_eq!(json["outcomes"][0]["result"]["subBets"][3]["foldName"], "Treble");
}
