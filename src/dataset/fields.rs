//! 数据集字段与取值域：封闭枚举（模型只能在这些值中选择）

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Record;

/// 生成封闭枚举：serde/JsonSchema 名称、`ALL`、`as_str`、`FromStr`
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            /// 错误信息中使用的取值域名称
            pub const LABEL: &'static str = $label;

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            pub fn values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }

            /// 忽略大小写匹配（语义选择时模型的自由文本）
            pub fn parse_loose(s: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.as_str().eq_ignore_ascii_case(s))
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        format!(
                            "'{}' is not a valid {} (expected one of: {})",
                            s,
                            $label,
                            Self::values().join(", ")
                        )
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum!(
    /// 结构化（分类）字段
    StructuredField, "structured field" {
        Category => "category",
        Intent => "intent",
    }
);

closed_enum!(
    /// 非结构化（文本）字段
    TextField, "text field" {
        Instruction => "instruction",
        Response => "response",
    }
);

closed_enum!(
    CategoryClass, "category" {
        Order => "ORDER",
        Shipping => "SHIPPING",
        Cancel => "CANCEL",
        Invoice => "INVOICE",
        Payment => "PAYMENT",
        Refund => "REFUND",
        Feedback => "FEEDBACK",
        Contact => "CONTACT",
        Account => "ACCOUNT",
        Delivery => "DELIVERY",
        Subscription => "SUBSCRIPTION",
    }
);

closed_enum!(
    IntentClass, "intent" {
        CancelOrder => "cancel_order",
        ChangeOrder => "change_order",
        ChangeShippingAddress => "change_shipping_address",
        CheckCancellationFee => "check_cancellation_fee",
        CheckInvoice => "check_invoice",
        CheckPaymentMethods => "check_payment_methods",
        CheckRefundPolicy => "check_refund_policy",
        Complaint => "complaint",
        ContactCustomerService => "contact_customer_service",
        ContactHumanAgent => "contact_human_agent",
        CreateAccount => "create_account",
        DeleteAccount => "delete_account",
        DeliveryOptions => "delivery_options",
        DeliveryPeriod => "delivery_period",
        EditAccount => "edit_account",
        GetInvoice => "get_invoice",
        GetRefund => "get_refund",
        NewsletterSubscription => "newsletter_subscription",
        PaymentIssue => "payment_issue",
        PlaceOrder => "place_order",
        RecoverPassword => "recover_password",
        RegistrationProblems => "registration_problems",
        Review => "review",
        SetUpShippingAddress => "set_up_shipping_address",
        SwitchAccount => "switch_account",
        TrackOrder => "track_order",
        TrackRefund => "track_refund",
    }
);

impl StructuredField {
    /// 该字段的合法取值
    pub fn domain(&self) -> Vec<&'static str> {
        match self {
            StructuredField::Category => CategoryClass::values(),
            StructuredField::Intent => IntentClass::values(),
        }
    }
}

/// 过滤条件：结构化字段 == 某个取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Category(CategoryClass),
    Intent(IntentClass),
}

impl Condition {
    /// 按字段解析取值；取值不属于该字段的取值域时返回错误说明
    pub fn parse(field: StructuredField, value: &str) -> Result<Self, String> {
        match field {
            StructuredField::Category => value.parse().map(Condition::Category),
            StructuredField::Intent => value.parse().map(Condition::Intent),
        }
    }

    pub fn field(&self) -> StructuredField {
        match self {
            Condition::Category(_) => StructuredField::Category,
            Condition::Intent(_) => StructuredField::Intent,
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Condition::Category(c) => c.as_str(),
            Condition::Intent(i) => i.as_str(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.structured(self.field()) == self.value()
    }

    pub fn describe(&self) -> String {
        format!("{} == {}", self.field(), self.value())
    }
}
