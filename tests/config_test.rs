use insight_hub::config::ScheduleConfig;
use insight_hub::utils::strip_html;

#[test]
fn schedule_parses_fixed_time_cron_expressions() {
    let schedule = ScheduleConfig::parse("30 6 * * *");
    assert_eq!((schedule.hour, schedule.minute), (6, 30));
}

#[test]
fn schedule_falls_back_and_clamps_on_bad_input() {
    let schedule = ScheduleConfig::parse("");
    assert_eq!((schedule.hour, schedule.minute), (8, 0));

    let schedule = ScheduleConfig::parse("*/5 * * * *");
    assert_eq!((schedule.hour, schedule.minute), (8, 0));

    let schedule = ScheduleConfig::parse("99 99 * * *");
    assert_eq!((schedule.hour, schedule.minute), (23, 59));
}

#[test]
fn html_is_stripped_and_capped_for_feed_bodies() {
    assert_eq!(
        strip_html("<p>Hello <b>world</b></p>", 500),
        "Hello world"
    );
    assert_eq!(strip_html("<div>abcdef</div>", 3), "abc");
    assert_eq!(strip_html("   plain   ", 500), "plain");
}
