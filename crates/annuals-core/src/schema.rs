/// Arrow schema and column conventions for company-year tables.
pub mod company_year {
    use arrow::datatypes::{DataType, Field, Schema};

    use crate::report::FieldGroup;

    pub const COMPANY_COLUMN: &str = "company_name";
    pub const YEAR_COLUMN: &str = "fiscal_year";
    pub const SMOOTHED_SUFFIX: &str = "_smoothed";

    /// Field order of the extraction schema. Columns outside this list sort
    /// after it by (group, name).
    pub const CANONICAL_FIELDS: &[(FieldGroup, &str)] = &[
        (FieldGroup::IncomeStatement, "revenue"),
        (FieldGroup::IncomeStatement, "cost_of_goods_sold"),
        (FieldGroup::IncomeStatement, "operating_expenses"),
        (FieldGroup::IncomeStatement, "wages_expense"),
        (FieldGroup::IncomeStatement, "tax_expense"),
        (FieldGroup::IncomeStatement, "depreciation"),
        (FieldGroup::IncomeStatement, "net_income"),
        (FieldGroup::BalanceSheet, "total_assets"),
        (FieldGroup::BalanceSheet, "current_assets"),
        (FieldGroup::BalanceSheet, "fixed_assets"),
        (FieldGroup::BalanceSheet, "total_liabilities"),
        (FieldGroup::BalanceSheet, "current_liabilities"),
        (FieldGroup::BalanceSheet, "long_term_liabilities"),
        (FieldGroup::BalanceSheet, "shareholders_equity"),
        (FieldGroup::Employees, "n_employees"),
        (FieldGroup::Employees, "n_blue_collar_workers"),
        (FieldGroup::Employees, "n_white_collar_workers"),
    ];

    /// Position of a field in [`CANONICAL_FIELDS`], if it is a known field.
    pub fn canonical_rank(group: FieldGroup, name: &str) -> Option<usize> {
        CANONICAL_FIELDS
            .iter()
            .position(|&(g, n)| g == group && n == name)
    }

    /// `revenue` → `revenue_smoothed`
    pub fn smoothed_column(name: &str) -> String {
        format!("{name}{SMOOTHED_SUFFIX}")
    }

    /// Identity columns followed by one nullable Float64 per numeric column.
    pub fn table_schema(columns: &[String]) -> Schema {
        let mut fields = Vec::with_capacity(columns.len() + 2);
        fields.push(Field::new(COMPANY_COLUMN, DataType::Utf8, false));
        fields.push(Field::new(YEAR_COLUMN, DataType::Int32, false));
        fields.extend(
            columns
                .iter()
                .map(|c| Field::new(c.as_str(), DataType::Float64, true)),
        );
        Schema::new(fields)
    }
}
