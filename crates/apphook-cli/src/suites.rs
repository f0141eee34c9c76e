//! Suites shipped with the binary.

use apphook_core::context::TestContext;
use apphook_core::runner::{Expect, Suite, TestError, TestFuture};

/// Writes `amount` into the main screen's amount field and checks that
/// something can be read back.
async fn set_and_read(ctx: &TestContext, expect: &mut Expect, amount: &str) -> Result<(), TestError> {
    let page = ctx.main_page();
    page.wait_for_amount(None).await?;
    page.set_amount(amount).await?;
    let value = page.get_amount().await?;
    expect.truthy("amount", &value);
    Ok(())
}

fn amount_100<'a>(ctx: &'a TestContext, expect: &'a mut Expect) -> TestFuture<'a> {
    Box::pin(set_and_read(ctx, expect, "100"))
}

fn amount_200<'a>(ctx: &'a TestContext, expect: &'a mut Expect) -> TestFuture<'a> {
    Box::pin(set_and_read(ctx, expect, "200"))
}

pub fn amount_suite() -> Suite {
    Suite::new("amount")
        .test("set and read amount (100)", amount_100)
        .test("set and read amount (200)", amount_200)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_suite_layout() {
        let suite = amount_suite();
        assert_eq!(suite.name(), "amount");
        assert_eq!(
            suite.test_names().collect::<Vec<_>>(),
            vec!["set and read amount (100)", "set and read amount (200)"]
        );
    }
}
