//! Static service menu shown after `/start`.

use std::path::{Path, PathBuf};

use crate::messaging::types::{LinkButton, LinkKeyboard, ReplyButton, ReplyKeyboard};

pub const WELCOME_TEXT: &str = "✅ 你已成功注册，可接收最新公告！\n请选择一个服务：";
pub const UNKNOWN_SELECTION_TEXT: &str = "请从菜单中选择一个选项。";
pub const FORM_PROMPT_TEXT: &str = "请点击下面的按钮打开表单并提交您的信息:";

const FORM_BUTTON_LABEL: &str = "📝 填写表单";
const SUPPORT_LABEL: &str = "🧑🏻‍💻 在线客服";
const SUPPORT_URL: &str = "https://t.me/HQBGSKF";

/// What a menu entry replies with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuReply {
    Photo {
        image: PathBuf,
        caption: String,
        keyboard: LinkKeyboard,
    },
    /// Text prompt with a reply-keyboard web-app button opening the
    /// registration form. Telegram only returns web app data from these.
    Form {
        prompt: String,
        keyboard: ReplyKeyboard,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub reply: MenuReply,
}

#[derive(Clone, Debug)]
pub struct Menu {
    layout: Vec<Vec<String>>,
    entries: Vec<MenuEntry>,
}

impl Menu {
    /// The logistics service menu. Photos are resolved under `image_dir`.
    pub fn standard(image_dir: &Path, web_app_url: &str) -> Self {
        let photo = |label: &str, file: &str, caption: &str, buttons: Vec<LinkButton>| MenuEntry {
            label: label.to_string(),
            reply: MenuReply::Photo {
                image: image_dir.join(file),
                caption: caption.to_string(),
                keyboard: LinkKeyboard::one_per_row(buttons),
            },
        };
        let support = || LinkButton::url(SUPPORT_LABEL, SUPPORT_URL);

        let entries = vec![
            photo(
                "✈ 落地接机",
                "接机.jpg",
                "🌟 欢迎加入【后勤接机】群 🌟\n\n✅ 请核对信息，如有更改，请联系客服！",
                vec![
                    support(),
                    LinkButton::url("✈ 接机频道", "https://t.me/+pqM959ERihBkYTc9"),
                ],
            ),
            photo(
                "🔖 证照办理",
                "passport.jpg",
                "📋 证照办理服务：\n\n✔️ 提供快速办理签证、护照及其他相关证件的服务。\n📞 点击客服咨询更多详情。",
                vec![
                    support(),
                    LinkButton::url("🔖 证件办理频道", "https://t.me/+sINSVji28vM4ZDJl"),
                ],
            ),
            photo(
                "🏤 房产租赁",
                "resized-image.jpg",
                "🏤 房产租赁信息：\n\n✔️ 提供房产出租和购房服务，涵盖各类房型。\n🔍 点击下方按钮了解更多。",
                vec![
                    support(),
                    LinkButton::url("🏤 房产信息频道", "https://t.me/+8i7xQLV_UiY2NTY1"),
                ],
            ),
            photo(
                "🏩 酒店预订",
                "sofietel.jpg",
                "🏨高端酒店预订代办服务| 索菲特 & 瑰丽酒店 |🏨\n\n✨ 奢华体验，优惠价格，预订更省心！ ✨\n\n📞 联系我们，轻松享受高端住宿！",
                vec![
                    support(),
                    LinkButton::url("🏩 酒店详情频道", "https://t.me/+M5Q_hf4xyG00YzRl"),
                ],
            ),
            MenuEntry {
                label: "📋 填写信息".to_string(),
                reply: MenuReply::Form {
                    prompt: FORM_PROMPT_TEXT.to_string(),
                    keyboard: ReplyKeyboard {
                        rows: vec![vec![ReplyButton::web_app(FORM_BUTTON_LABEL, web_app_url)]],
                        resize: true,
                        one_time: true,
                    },
                },
            },
            photo(
                "🔔 后勤生活信息频道",
                "logistic.png",
                "📌 主要提供各种后勤管理和生活服务，确保用户能够方便、高效地获取信息和帮助。",
                vec![LinkButton::url("🔔 详细了解", "https://t.me/+QQ56RVTKshQxMDU1")],
            ),
        ];

        let layout: Vec<Vec<String>> = [
            ["✈ 落地接机", "🔖 证照办理"],
            ["🏤 房产租赁", "🏩 酒店预订"],
            ["📋 填写信息", "🔔 后勤生活信息频道"],
        ]
        .iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect();

        Self { layout, entries }
    }

    pub fn reply_keyboard(&self) -> ReplyKeyboard {
        ReplyKeyboard {
            rows: self
                .layout
                .iter()
                .map(|row| row.iter().map(ReplyButton::text).collect())
                .collect(),
            resize: true,
            one_time: false,
        }
    }

    pub fn lookup(&self, label: &str) -> Option<&MenuEntry> {
        let label = label.trim();
        self.entries.iter().find(|e| e.label == label)
    }
}
