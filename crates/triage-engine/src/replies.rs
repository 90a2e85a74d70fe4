//! Localized reply text. The engine only selects a handler; everything a
//! handler says lives here as data. English is the fallback for `other`.

use triage_core::Lang;

pub fn courier_check(lang: Lang) -> &'static str {
    match lang {
        Lang::Lv => "Mēs sazināsimies ar kurjeriem un visu pārbaudīsim, atgriezīsimies ar atbildi.",
        Lang::Ee => "Võtame ühendust kulleritega ja kontrollime kõike üle, anname peagi teada.",
        Lang::Ru => "Мы свяжемся с курьерами и всё проверим, дадим ответ.",
        Lang::Eng | Lang::Other => {
            "We will check in with our couriers and review everything, we'll get back to you."
        }
    }
}

/// True for local wall-clock hours where a caveat is added to the courier
/// reply: [22:00, 24:00) and [00:00, 07:00).
pub fn is_late_or_early(hour: u32) -> bool {
    hour >= 22 || hour < 7
}

/// The "very late / very early" caveat. Callers only invoke this for
/// hours where [`is_late_or_early`] holds.
pub fn time_caveat(lang: Lang, hour: u32) -> &'static str {
    let late = (22..24).contains(&hour);
    match lang {
        Lang::Lv => {
            if late {
                "Ņemot vērā, ka ir ļoti vēls, šobrīd nevaram garantēt tūlītēju risinājumu."
            } else {
                "Ņemot vērā, ka ir ļoti agrs rīts, šobrīd nevaram garantēt tūlītēju risinājumu."
            }
        }
        Lang::Ee => {
            if late {
                "Kuna on väga hiline aeg, ei saa me praegu lahendust garanteerida."
            } else {
                "Kuna on väga varajane hommik, ei saa me praegu lahendust garanteerida."
            }
        }
        Lang::Ru => {
            if late {
                "Сейчас очень поздно, поэтому мы не можем гарантировать быстрое решение."
            } else {
                "Сейчас очень рано утром, поэтому мы не можем гарантировать быстрое решение."
            }
        }
        Lang::Eng | Lang::Other => {
            if late {
                "Since it is very late, we can't guarantee to resolve the issue right now."
            } else {
                "Since it is very early in the morning, we can't guarantee to resolve the issue right now."
            }
        }
    }
}

/// The three-message drop-search script.
pub fn gather_drop_info(lang: Lang) -> [&'static str; 3] {
    match lang {
        Lang::Lv => [
            "Paroc dziļāk – bieži drops ir līdz 10–15 cm zemē",
            "Vai tiešām esi īstajā vietā?",
            "Ja vēl neatrodi, atsūti dažas bildes vai video ar tuvplānu dropa vietai un apkārtnei",
        ],
        Lang::Ee => [
            "Kaevu natuke sügavamale – drop võib olla 10–15 cm sügavusel",
            "Oled kindel, et oled õiges kohas?",
            "Kui ikka veel ei leia, saada mõned pildid või video, kus on näha drop'i koht ja ümbrus lähivaates",
        ],
        Lang::Ru => [
            "Попробуй копнуть глубже – дроп может быть на глубине 10–15 см",
            "Ты уверен, что смотришь в правильном месте?",
            "Если всё ещё не нашёл, пришли фото или видео с крупным планом дропа и её окружения",
        ],
        Lang::Eng | Lang::Other => [
            "Try digging deeper – the drop might be 10–15cm underground",
            "Are you sure you're at the right spot?",
            "If you still can't find it, send a few photos or a video clearly showing the drop location and surroundings",
        ],
    }
}

pub fn voice_nudge() -> [&'static str; 2] {
    [
        "Can you please send text instead of a voice message?",
        "My phones audio doesn't work",
    ]
}

pub fn restock_info(lang: Lang) -> &'static str {
    match lang {
        Lang::Lv => "Pašlaik mums nav informācijas par šo preci, bet mēs cenšamies pēc iespējas ātrāk atjaunot krājumus visiem produktiem",
        Lang::Ee => "Hetkel pole meil selle toote kohta infot, kuid püüame kõik tooted võimalikult kiiresti laost uuesti kättesaadavaks teha",
        Lang::Ru => "Сейчас у нас нет информации об этом товаре, но мы стараемся как можно быстрее пополнить все запасы",
        Lang::Eng | Lang::Other => "Currently we don't have any info about that, but we're trying to restock every product as soon as possible",
    }
}

pub fn product_availability(lang: Lang, bot_username: &str) -> [String; 2] {
    match lang {
        Lang::Lv => [
            format!("Ja @{bot_username} rāda produktu un vēlamo daudzumu izvēlētajā lokācijā, tad tas ir pieejams"),
            "Ja tas nav pieejams, mēs darām visu iespējamo, lai to pēc iespējas ātrāk papildinātu".to_string(),
        ],
        Lang::Ee => [
            format!("Kui @{bot_username} kuvab sinu soovitud toote ja koguse valitud asukohas, siis on see saadaval"),
            "Kui see pole saadaval, teeme kõik endast oleneva, et see võimalikult kiiresti uuesti laos oleks".to_string(),
        ],
        Lang::Ru => [
            format!("Если @{bot_username} показывает нужный товар и нужное количество в выбранной локации, значит он доступен"),
            "Если его нет в наличии, мы делаем всё возможное, чтобы как можно скорее пополнить запасы".to_string(),
        ],
        Lang::Eng | Lang::Other => [
            format!("If @{bot_username} lists the product and amount you wish to buy at your desired location, then it is available"),
            "If it's not available, we are doing our best to restock it as soon as possible".to_string(),
        ],
    }
}

pub fn arrival_time(lang: Lang) -> &'static str {
    match lang {
        Lang::Lv => "Piegādes laiks pēc maksājuma:\n\n\
            TRX / USDT / ETH: līdz 3 min\n\
            Litecoin / Karte: 5-15 min\n\
            Bitcoin: 10-60 min\n\n\
            ⏳ Apmaksa var dažkārt aizņemt ilgāku laiku. Ja gaidi pārāk ilgi, sazinies ar mums vēlreiz.\n\n\
            🔒 Ja maksā ar karti caur Mercuryo: tā nav mūsu platforma, un mēs neesam atbildīgi par viņu sistēmas aizkavēm vai problēmām. Ja rodas kādas problēmas, lūdzu, sazinies ar Mercuryo atbalstu, nevis ar mums.",
        Lang::Ee => "Kohaletoimetamise aeg pärast makset:\n\n\
            TRX / USDT / ETH: kuni 3 min\n\
            Litecoin / Kaart: 5-15 min\n\
            Bitcoin: 10-60 min\n\n\
            ⏳ Mõnikord võib makse töötlemine võtta kauem aega. Kui ootad liiga kaua, võta meiega uuesti ühendust.\n\n\
            🔒 Kui maksad kaardiga läbi Mercuryo: see ei ole meie platvorm ja me ei vastuta nende viivituste ega probleemide eest. Probleemide korral võta ühendust Mercuryo klienditoega, mitte meiega.",
        Lang::Ru => "Время доставки после оплаты:\n\n\
            TRX / USDT / ETH: до 3 мин\n\
            Litecoin / Карта: 5-15 мин\n\
            Bitcoin: 10-60 мин\n\n\
            ⏳ Иногда обработка платежа может занять больше времени. Если вы ждёте слишком долго - напишите нам снова.\n\n\
            🔒 При оплате картой через Mercuryo: это не наша платформа, и мы не несем ответственности за её задержки или ошибки. В случае проблем обращайтесь в поддержку Mercuryo, а не к нам.",
        Lang::Eng | Lang::Other => "Delivery time after payment:\n\n\
            TRX / USDT / ETH: up to 3 min\n\
            Litecoin / Card: 5–15 min\n\
            Bitcoin: 10–60 min\n\n\
            ⏳ Payment processing could sometimes take longer. Contact us again if you're waiting too long.\n\n\
            🔒 If paying by card via Mercuryo: it's not our platform and we are not responsible for their delays or issues. If something goes wrong, please contact Mercuryo support, not us.",
    }
}

pub const CRYPTO_GUIDE: &str = "<b>💸 How to Pay with Crypto (BTC, ETH, LTC, TRX, USDT-TRC20)</b>\n\n\
    1. Buy crypto using any wallet - we recommend <a href=\"https://www.bybit.com/\">Bybit</a>\n\n\
    2. Send the exact amount to the wallet address we give you when you make an order.\n\n\
    <b>⚡ Best Option: LTC or USDT-TRC20</b> — low fees &amp; fast confirmation.\n\n\
    3. Once confirmed, you'll get your order.";

pub const CARD_GUIDE_CAPTION: &str = "<b>💳 How to Pay with Card</b>\n\n\
    1. Copy the wallet address we send.\n\n\
    2. Go to <a href=\"https://exchange.mercuryo.io/\">exchange.mercuryo.io</a>.\n\n\
    3. Pick LTC, paste the LTC amount under \"You get\", click buy. Then paste in the wallet address. Then enter your card details and pay.\n\n\
    ✅ Once we get the crypto, your order is sent.\n\n\
    <b>🔒 Note:</b> We don't own Mercuryo - your info stays private.\n\n\
    ⚠️ Exchange fees apply. Crypto payments are cheaper &amp; faster!";

pub const PAYMENT_WARNING: &str = "<b>‼️ Important Before You Pay ‼️</b>\n\n\
    Some crypto like BTC can be slow when the network is busy.\n\n\
    ✅ For faster delivery, use <b>TRX</b>, <b>ETH</b> or <b>USDT-TRC20</b>.";

pub const THUMBS_UP: &str = "👍";

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_LANGS: [Lang; 5] = [Lang::Lv, Lang::Ee, Lang::Ru, Lang::Eng, Lang::Other];

    #[test]
    fn other_falls_back_to_english() {
        assert_eq!(courier_check(Lang::Other), courier_check(Lang::Eng));
        assert_eq!(restock_info(Lang::Other), restock_info(Lang::Eng));
        assert_eq!(arrival_time(Lang::Other), arrival_time(Lang::Eng));
    }

    #[test]
    fn every_lang_has_three_drop_search_lines() {
        for lang in ALL_LANGS {
            let lines = gather_drop_info(lang);
            assert!(lines.iter().all(|l| !l.is_empty()));
        }
    }

    #[test]
    fn availability_mentions_the_bot_handle() {
        for lang in ALL_LANGS {
            let [first, _second] = product_availability(lang, "shop_bot");
            assert!(first.contains("@shop_bot"), "{lang}: {first}");
        }
    }

    #[test]
    fn caveat_hours() {
        assert!(is_late_or_early(22));
        assert!(is_late_or_early(23));
        assert!(is_late_or_early(0));
        assert!(is_late_or_early(6));
        assert!(!is_late_or_early(7));
        assert!(!is_late_or_early(12));
        assert!(!is_late_or_early(21));
    }

    #[test]
    fn caveat_distinguishes_late_from_early() {
        assert_ne!(time_caveat(Lang::Eng, 23), time_caveat(Lang::Eng, 3));
        for lang in ALL_LANGS {
            assert!(!time_caveat(lang, 22).is_empty());
            assert!(!time_caveat(lang, 5).is_empty());
        }
    }
}
